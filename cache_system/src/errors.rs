//! Error types for cache operations
//!
//! This module defines the errors raised by the cache itself and the
//! shared error type stored on entries whose fetch failed.

use std::error::Error as StdError;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// Cache system errors
#[derive(Error, Debug)]
pub enum CacheError {
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

/// Error produced by a fetch function.
///
/// Cloneable so that every subscriber of an entry can observe the same failure.
/// The original error is kept intact and can be recovered with [`FetchError::downcast_ref`].
#[derive(Clone)]
pub struct FetchError(Arc<dyn StdError + Send + Sync + 'static>);

impl FetchError {
    pub fn new<E>(error: E) -> Self
    where
        E: Into<Box<dyn StdError + Send + Sync + 'static>>,
    {
        Self(Arc::from(error.into()))
    }

    /// Borrow the original error as a concrete type
    pub fn downcast_ref<E: StdError + 'static>(&self) -> Option<&E> {
        self.0.downcast_ref::<E>()
    }

    pub fn inner(&self) -> &(dyn StdError + Send + Sync + 'static) {
        &*self.0
    }
}

impl fmt::Debug for FetchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("FetchError").field(&self.0).finish()
    }
}

impl fmt::Display for FetchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&*self.0, f)
    }
}

impl StdError for FetchError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.0.source()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Error, PartialEq)]
    #[error("backend said {0}")]
    struct BackendError(u16);

    #[test]
    fn test_original_error_is_recoverable() {
        let error = FetchError::new(BackendError(503));
        let cloned = error.clone();

        assert_eq!(cloned.to_string(), "backend said 503");
        assert_eq!(cloned.downcast_ref::<BackendError>(), Some(&BackendError(503)));
        assert!(cloned.downcast_ref::<serde_json::Error>().is_none());
    }

    #[test]
    fn test_plain_messages_are_accepted() {
        let error = FetchError::new("connection reset");
        assert_eq!(error.to_string(), "connection reset");
    }
}
