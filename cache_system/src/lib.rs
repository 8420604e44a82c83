//! Cache system for in-memory query caching
//!
//! This crate provides the shared cache store: structured keys, entries with
//! freshness metadata, de-duplicated fetches ordered by generation, prefix
//! invalidation and eviction of unobserved entries.

pub mod entry;
pub mod errors;
pub mod keys;
pub mod manager;
pub mod params;
pub mod prelude;
pub mod subscription;

// Re-export centralized config
pub use config::CacheConfig;

pub use entry::{CacheValue, EntrySnapshot, EntryState, FetchFuture, Fetcher, InFlight};
pub use errors::{CacheError, FetchError};
pub use keys::{CacheKey, KeyKind, QueryKeys};
pub use manager::{CacheManager, EnsureOutcome};
pub use params::CacheParams;
pub use subscription::Subscription;
