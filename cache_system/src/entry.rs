//! Cache entries and their observable snapshots

use crate::errors::FetchError;
use crate::params::CacheParams;
use chrono::{DateTime, Utc};
use futures::future::{BoxFuture, Shared};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use uuid::Uuid;

/// Values are stored untyped; consumers decode on read
pub type CacheValue = serde_json::Value;

/// Future returned by a fetch function
pub type FetchFuture = BoxFuture<'static, Result<CacheValue, FetchError>>;

/// Fetch function registered for a key
pub type Fetcher = Arc<dyn Fn() -> FetchFuture + Send + Sync>;

/// Handle to a running fetch, shared by everyone waiting on the same key
pub type InFlight = Shared<FetchFuture>;

/// Lifecycle state of an entry
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum EntryState {
    #[default]
    Idle,
    Pending,
    Success,
    Error,
}

/// Point-in-time view of an entry, published to subscribers on every change
#[derive(Debug, Clone, Default)]
pub struct EntrySnapshot {
    pub state: EntryState,
    pub value: Option<CacheValue>,
    pub error: Option<FetchError>,
    pub updated_at: Option<DateTime<Utc>>,
    pub is_fetching: bool,
    pub is_invalidated: bool,
}

pub(crate) struct CacheEntry {
    /// Distinguishes this entry from a later one created under the same key
    pub(crate) id: Uuid,
    pub(crate) state: EntryState,
    pub(crate) value: Option<CacheValue>,
    pub(crate) error: Option<FetchError>,
    pub(crate) fetched_at: Option<Instant>,
    pub(crate) updated_at: Option<DateTime<Utc>>,
    pub(crate) gc_after: Duration,
    pub(crate) invalidated: bool,
    pub(crate) subscribers: usize,
    pub(crate) fetcher: Option<Fetcher>,
    pub(crate) in_flight: Option<InFlight>,
    /// Generation of the most recently started fetch
    pub(crate) generation: u64,
    /// Generation whose result is currently applied
    pub(crate) applied_generation: u64,
    /// Latest generation already running when the entry was invalidated
    pub(crate) invalidated_generation: u64,
    pub(crate) gc_task: Option<JoinHandle<()>>,
    pub(crate) notifier: watch::Sender<EntrySnapshot>,
}

impl CacheEntry {
    pub(crate) fn new(params: &CacheParams) -> Self {
        let (notifier, _) = watch::channel(EntrySnapshot::default());
        Self {
            id: Uuid::new_v4(),
            state: EntryState::Idle,
            value: None,
            error: None,
            fetched_at: None,
            updated_at: None,
            gc_after: params.gc_time,
            invalidated: false,
            subscribers: 0,
            fetcher: None,
            in_flight: None,
            generation: 0,
            applied_generation: 0,
            invalidated_generation: 0,
            gc_task: None,
            notifier,
        }
    }

    pub(crate) fn snapshot(&self) -> EntrySnapshot {
        EntrySnapshot {
            state: self.state,
            value: self.value.clone(),
            error: self.error.clone(),
            updated_at: self.updated_at,
            is_fetching: self.in_flight.is_some(),
            is_invalidated: self.invalidated,
        }
    }

    /// Push the current snapshot to every receiver
    pub(crate) fn publish(&self) {
        self.notifier.send_replace(self.snapshot());
    }

    pub(crate) fn is_fresh_within(&self, stale_time: Duration) -> bool {
        if self.invalidated || self.value.is_none() {
            return false;
        }
        match self.fetched_at {
            Some(at) => at.elapsed() < stale_time,
            None => false,
        }
    }

    pub(crate) fn apply_value(&mut self, value: CacheValue) {
        self.state = EntryState::Success;
        self.value = Some(value);
        self.error = None;
        self.fetched_at = Some(Instant::now());
        self.updated_at = Some(Utc::now());
        self.invalidated = false;
    }

    /// Record a failure; the last good value stays available
    pub(crate) fn apply_error(&mut self, error: FetchError) {
        self.state = EntryState::Error;
        self.error = Some(error);
        self.invalidated = false;
    }

    pub(crate) fn cancel_gc(&mut self) {
        if let Some(task) = self.gc_task.take() {
            task.abort();
        }
    }
}

impl Drop for CacheEntry {
    fn drop(&mut self) {
        self.cancel_gc();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test(start_paused = true)]
    async fn test_freshness_window() {
        let stale_time = Duration::from_secs(10);
        let mut entry = CacheEntry::new(&CacheParams::default());
        assert!(!entry.is_fresh_within(stale_time));

        entry.apply_value(json!([1, 2]));
        assert!(entry.is_fresh_within(stale_time));
        assert!(!entry.is_fresh_within(Duration::ZERO));

        tokio::time::advance(stale_time).await;
        assert!(!entry.is_fresh_within(stale_time));

        entry.apply_value(json!([3]));
        entry.invalidated = true;
        assert!(!entry.is_fresh_within(stale_time));
    }

    #[test]
    fn test_error_keeps_previous_value() {
        let mut entry = CacheEntry::new(&CacheParams::default());
        entry.apply_value(json!({"id": 1}));
        entry.invalidated = true;
        entry.apply_error(FetchError::new("boom"));

        let snapshot = entry.snapshot();
        assert_eq!(snapshot.state, EntryState::Error);
        assert_eq!(snapshot.value, Some(json!({"id": 1})));
        assert_eq!(snapshot.error.map(|e| e.to_string()), Some("boom".to_string()));
        assert!(!snapshot.is_invalidated);
        assert!(!snapshot.is_fetching);
    }
}
