use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::RwLock;

use config::SignalConfig;

use crate::event::CacheEvent;
use crate::types::{CallbackId, EventCallback, SignalError};

/// Signal manager for cache event notifications
pub struct SignalManager {
    callbacks: RwLock<Vec<(CallbackId, EventCallback)>>,
    next_id: AtomicU64,
    config: SignalConfig,
}

impl std::fmt::Debug for SignalManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SignalManager")
            .field("callback_count", &self.callback_count())
            .field("config", &self.config)
            .finish()
    }
}

impl SignalManager {
    pub fn new() -> Self {
        Self::with_config(SignalConfig::default())
    }

    pub fn with_config(config: SignalConfig) -> Self {
        Self {
            callbacks: RwLock::new(Vec::new()),
            next_id: AtomicU64::new(1),
            config,
        }
    }

    /// Add event callback
    pub fn add_callback<F>(&self, callback: F) -> Result<CallbackId, SignalError>
    where
        F: Fn(&CacheEvent) + Send + Sync + 'static,
    {
        let mut callbacks = self
            .callbacks
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        if callbacks.len() >= self.config.max_callbacks {
            tracing::warn!(
                max_callbacks = self.config.max_callbacks,
                "rejecting signal callback registration"
            );
            return Err(SignalError::TooManyCallbacks(self.config.max_callbacks));
        }

        let id = CallbackId(self.next_id.fetch_add(1, Ordering::Relaxed));
        callbacks.push((id, Box::new(callback)));
        Ok(id)
    }

    /// Remove a previously registered callback
    pub fn remove_callback(&self, id: CallbackId) -> bool {
        let mut callbacks = self
            .callbacks
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let before = callbacks.len();
        callbacks.retain(|(existing, _)| *existing != id);
        callbacks.len() != before
    }

    /// Emit event to all subscribers
    pub fn emit(&self, event: CacheEvent) {
        if let Ok(callbacks) = self.callbacks.read() {
            for (_, callback) in callbacks.iter() {
                callback(&event);
            }
        }
    }

    /// Clear all callbacks
    pub fn clear_callbacks(&self) {
        if let Ok(mut callbacks) = self.callbacks.write() {
            callbacks.clear();
        }
    }

    /// Get number of registered callbacks
    pub fn callback_count(&self) -> usize {
        self.callbacks.read().map(|c| c.len()).unwrap_or(0)
    }

    pub fn config(&self) -> &SignalConfig {
        &self.config
    }
}

impl Default for SignalManager {
    fn default() -> Self {
        Self::new()
    }
}
