//! Store Object - repository layer for QueryHaus
//!
//! This crate provides the transport contract and its implementations, list
//! request options and pagination, and the generic repository that turns an
//! entity name into cached CRUD access.

pub mod errors;
pub mod generic_store;
pub mod prelude;
pub mod query_builder;
pub mod traits;
pub mod transport;
pub mod validation;

pub use cache_system::CacheParams;
pub use errors::{RepositoryError, TransportError};
pub use generic_store::{Repository, UpdateInput};
pub use query_builder::{ListResponse, Pagination, RequestOptions, SortOrder};
pub use traits::*;
pub use transport::{HttpTransport, MockResponse, MockTransport};
pub use validation::{ValidatedEntityName, ValidationError};
