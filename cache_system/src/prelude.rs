//! Convenience re-exports for common cache-system usage

// Core cache system components
pub use crate::entry::{CacheValue, EntrySnapshot, EntryState, Fetcher, InFlight};
pub use crate::errors::{CacheError, FetchError};
pub use crate::keys::{CacheKey, KeyKind, QueryKeys};
pub use crate::manager::{CacheManager, EnsureOutcome};
pub use crate::params::CacheParams;
pub use crate::subscription::Subscription;

// Re-export centralized config
pub use config::CacheConfig;

// Common external dependencies
pub use serde::{Deserialize, Serialize};
pub use serde_json;
pub use tokio;
