//! # QueryHaus
//!
//! A client-side data layer for REST backends: keyed query caching with stale
//! and garbage-collection timing, request deduplication, mutations that keep
//! the cache in line with the backend, and generic per-entity repositories.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use queryhaus::prelude::*;
//!
//! #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
//! pub struct User {
//!     pub id: u64,
//!     pub name: String,
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = AppConfig::load()?;
//!     let queryhaus = QueryHaus::new(config)?;
//!
//!     let users = queryhaus.repository::<User>("users")?;
//!
//!     let options = RequestOptions::new()
//!         .with_pagination(Pagination::new(0, 10))
//!         .order_by_field("name");
//!     let mut page = users.fetch_page(&options);
//!     let result = page.settled().await;
//!     println!("{} users", result.data.map(|page| page.total).unwrap_or(0));
//!
//!     users
//!         .create::<serde_json::Value>()
//!         .mutate_async(serde_json::json!({ "name": "Ada" }))
//!         .await?;
//!
//!     Ok(())
//! }
//! ```

/// Conditional debug logging macros
/// These macros only compile in code when the `debug-logging` feature is enabled
#[cfg(feature = "debug-logging")]
#[macro_export]
macro_rules! debug_log {
    ($($arg:tt)*) => {
        tracing::debug!($($arg)*)
    };
}

#[cfg(not(feature = "debug-logging"))]
#[macro_export]
macro_rules! debug_log {
    ($($arg:tt)*) => {};
}

#[cfg(feature = "debug-logging")]
#[macro_export]
macro_rules! trace_log {
    ($($arg:tt)*) => {
        tracing::trace!($($arg)*)
    };
}

#[cfg(not(feature = "debug-logging"))]
#[macro_export]
macro_rules! trace_log {
    ($($arg:tt)*) => {};
}

pub mod core;
pub mod errors;
pub mod prelude;

// Re-export the main public types for convenience
pub use core::QueryHaus;
pub use errors::QueryHausError;

// Re-export centralized config
pub use config::{AppConfig, CacheConfig, SignalConfig, TransportConfig};

// Re-export internal crates used by the public API
pub use cache_system;
pub use query_system;
pub use signal_system;
pub use store_object;

// Re-export external dependencies used in public API
pub use async_trait;
