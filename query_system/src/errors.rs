//! Error types for queries and mutations

use cache_system::FetchError;
use thiserror::Error;

/// Query system errors
#[derive(Error, Debug, Clone)]
pub enum QueryError {
    /// The fetch or mutation function failed; the original error is preserved
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error("Failed to decode cached value for {key}: {message}")]
    Decode { key: String, message: String },

    #[error("Serialization error: {0}")]
    Serialization(String),

    /// The cache entry behind the query was removed
    #[error("Query was cancelled")]
    Cancelled,
}

impl QueryError {
    /// Borrow the error returned by the fetch or mutation function as a concrete type
    pub fn downcast_ref<E: std::error::Error + 'static>(&self) -> Option<&E> {
        match self {
            QueryError::Fetch(error) => error.downcast_ref::<E>(),
            _ => None,
        }
    }

    pub(crate) fn decode(key: impl ToString, error: serde_json::Error) -> Self {
        QueryError::Decode {
            key: key.to_string(),
            message: error.to_string(),
        }
    }
}

impl From<cache_system::CacheError> for QueryError {
    fn from(error: cache_system::CacheError) -> Self {
        QueryError::Serialization(error.to_string())
    }
}
