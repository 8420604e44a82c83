//! Error types for the QueryHaus crate
//!
//! This module contains all error types that can be returned by QueryHaus operations.

use config::ConfigError;
use store_object::{RepositoryError, TransportError};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum QueryHausError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("Repository error: {0}")]
    Repository(#[from] RepositoryError),

    #[error("Repository not found: {0}")]
    RepositoryNotFound(String),

    #[error("Repository already registered: {0}")]
    RepositoryAlreadyRegistered(String),
}
