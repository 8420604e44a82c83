//! Type definitions for signal system

use crate::event::CacheEvent;
use thiserror::Error;

/// Event callback invoked for every emitted cache event
pub type EventCallback = Box<dyn Fn(&CacheEvent) + Send + Sync>;

/// Identifier handed out on callback registration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CallbackId(pub(crate) u64);

impl std::fmt::Display for CallbackId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "callback#{}", self.0)
    }
}

/// Signal system errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SignalError {
    #[error("Callback limit reached: at most {0} callbacks may be registered")]
    TooManyCallbacks(usize),
}
