//! Convenience re-exports for common query-system usage

pub use crate::client::QueryClient;
pub use crate::errors::QueryError;
pub use crate::mutation::{Mutation, MutationState, MutationStatus};
pub use crate::options::QueryOptions;
pub use crate::query::{Query, QueryResult, QueryStatus};
pub use crate::reactive::ReactiveQuery;

pub use cache_system::{CacheKey, CacheManager, CacheParams, FetchError, QueryKeys};
pub use signal_system::Reactive;
