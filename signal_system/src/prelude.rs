//! Convenience re-exports for common signal-system usage

// Core signal system components
pub use crate::event::{CacheEvent, EventType};
pub use crate::manager::SignalManager;
pub use crate::reactive::{Effect, Reactive, ReactiveVersion};
pub use crate::types::{CallbackId, EventCallback, SignalError};

// Re-export centralized config
pub use config::SignalConfig;

// Common external dependencies
pub use serde::{Deserialize, Serialize};
pub use serde_json;
pub use tokio;
