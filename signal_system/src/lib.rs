//! Signal system for cache event handling
//!
//! This crate provides cache lifecycle events, callback registration and the
//! reactive value primitives used to drive re-keyed queries in the QueryHaus ecosystem.

pub mod event;
pub mod manager;
pub mod prelude;
pub mod reactive;
pub mod types;

// Re-export centralized config
pub use config::SignalConfig;

pub use event::{CacheEvent, EventType};
pub use manager::SignalManager;
pub use reactive::{Effect, Reactive, ReactiveVersion};
pub use types::{CallbackId, EventCallback, SignalError};
