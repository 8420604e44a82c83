//! Cache event types and definitions
//!
//! This module defines the structure of cache lifecycle events
//! that flow through the signal system.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Cache event type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventType {
    /// A fetch resolved and its value was applied to the entry
    Fetched,
    /// A fetch failed and the error was stored on the entry
    FetchFailed,
    /// The entry was marked stale by a prefix invalidation
    Invalidated,
    /// The entry was dropped from the cache
    Removed,
    /// The value was written directly, without a fetch
    Updated,
}

/// Cache event
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheEvent {
    /// Event type
    pub event_type: EventType,
    /// Entity namespace of the key
    pub entity: String,
    /// Rendered cache key
    pub key: String,
    /// Fetch generation that produced the event, if any
    pub generation: Option<u64>,
    /// Additional data
    pub payload: HashMap<String, serde_json::Value>,
    /// Event timestamp (UTC)
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

impl CacheEvent {
    pub fn new(event_type: EventType, entity: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            event_type,
            entity: entity.into(),
            key: key.into(),
            generation: None,
            payload: HashMap::new(),
            timestamp: chrono::Utc::now(),
        }
    }

    pub fn with_generation(mut self, generation: u64) -> Self {
        self.generation = Some(generation);
        self
    }

    pub fn with_payload(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.payload.insert(key.into(), value);
        self
    }

    pub fn add_payload(&mut self, key: impl Into<String>, value: serde_json::Value) {
        self.payload.insert(key.into(), value);
    }
}
