//! Convenience re-exports for common store-object usage

// Core traits
pub use crate::traits::{Method, Model, StoreObject, Transport, TransportRequest, TransportResponse};

// Error types
pub use crate::errors::{RepositoryError, TransportError};

// Core store functionality
pub use crate::generic_store::{Repository, UpdateInput};

// Transports
pub use crate::transport::{HttpTransport, MockResponse, MockTransport};

// Validation
pub use crate::validation::{ValidatedEntityName, ValidationError};

// Query building
pub use crate::query_builder::{ListResponse, Pagination, RequestOptions, SortOrder};

// Cache params (re-exported from cache_system)
pub use crate::CacheParams;

// Common external dependencies that are frequently used
pub use async_trait::async_trait;
pub use query_system::{Mutation, Query, QueryClient, QueryOptions, QueryResult, ReactiveQuery};
pub use serde::{Deserialize, Serialize};
pub use signal_system::Reactive;
