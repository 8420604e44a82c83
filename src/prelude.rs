//! Convenience re-exports for common QueryHaus usage
//!
//! This prelude module re-exports the most commonly used items from the QueryHaus ecosystem,
//! making it easier to import everything you need with a single use statement.
//!
//! # Example
//!
//! ```rust
//! use queryhaus::prelude::*;
//!
//! // Now you have access to all the common QueryHaus types and traits
//! ```

// Core QueryHaus components
pub use crate::core::QueryHaus;
pub use crate::errors::QueryHausError;

// Re-export centralized config
pub use config::{AppConfig, CacheConfig, ConfigError, SignalConfig, TransportConfig};

// Repository layer
pub use store_object::prelude::*;

// Query layer
pub use query_system::{
    MutationState, MutationStatus, QueryError, QueryStatus,
};

// Re-export signal system for event handling
pub use signal_system::prelude::*;

// Re-export cache system
pub use cache_system::prelude::*;

// Common external dependencies
pub use anyhow;
pub use tokio;
