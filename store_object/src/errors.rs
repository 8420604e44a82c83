use crate::traits::transport::Method;
use crate::validation::ValidationError;
use query_system::QueryError;
use serde_json::Value;
use thiserror::Error;

/// Failures reported by a [`Transport`](crate::traits::Transport)
#[derive(Error, Debug, Clone)]
pub enum TransportError {
    #[error("{method} {url} failed with status {status}")]
    Status {
        status: u16,
        method: Method,
        url: String,
        body: Option<Value>,
    },

    #[error("Network error: {0}")]
    Network(String),

    #[error("Failed to decode response: {0}")]
    Decode(String),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
}

impl TransportError {
    pub fn status(&self) -> Option<u16> {
        match self {
            TransportError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }
}

#[derive(Error, Debug)]
pub enum RepositoryError {
    #[error("Invalid entity name: {0}")]
    InvalidEntityName(#[from] ValidationError),

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Query(#[from] QueryError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl RepositoryError {
    /// The transport failure behind this error, if any
    pub fn transport(&self) -> Option<&TransportError> {
        match self {
            RepositoryError::Transport(error) => Some(error),
            RepositoryError::Query(error) => error.downcast_ref::<TransportError>().or_else(|| {
                error
                    .downcast_ref::<RepositoryError>()
                    .and_then(RepositoryError::transport)
            }),
            _ => None,
        }
    }
}
