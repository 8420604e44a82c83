//! Cache manager implementation
//!
//! This module provides the in-memory CacheManager: entry lifecycle,
//! request de-duplication, ordered settlement of fetches, invalidation
//! and delayed eviction of unobserved entries.

use crate::entry::{CacheEntry, CacheValue, EntrySnapshot, EntryState, Fetcher, InFlight};
use crate::errors::{CacheError, FetchError};
use crate::keys::CacheKey;
use crate::params::CacheParams;
use crate::subscription::Subscription;
use futures::FutureExt;
use serde::Serialize;
use serde::de::DeserializeOwned;
use signal_system::{CacheEvent, EventType, SignalManager};
use std::collections::HashMap;
use std::fmt::Debug;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;
use tokio::runtime::Handle;
use uuid::Uuid;

/// Result of [`CacheManager::ensure`]
pub enum EnsureOutcome {
    /// A fresh value was already cached
    Fresh(CacheValue),
    /// A fetch is running; await it for the value
    Fetching(InFlight),
}

/// Shared in-memory cache for every entity
#[derive(Clone)]
pub struct CacheManager {
    inner: Arc<Inner>,
}

struct Inner {
    entries: Mutex<HashMap<CacheKey, CacheEntry>>,
    params: CacheParams,
    signals: Option<Arc<SignalManager>>,
}

enum GcAction {
    Keep,
    RemoveNow,
    Schedule(Duration),
}

impl Debug for CacheManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CacheManager")
            .field("params", &self.inner.params)
            .field("entries", &self.len())
            .field("signals", &self.inner.signals.is_some())
            .finish()
    }
}

impl CacheManager {
    /// Create a new cache manager
    pub fn new(params: CacheParams) -> Self {
        Self::build(params, None)
    }

    /// Create a cache manager that reports lifecycle events to `signals`
    pub fn with_signals(params: CacheParams, signals: Arc<SignalManager>) -> Self {
        Self::build(params, Some(signals))
    }

    fn build(params: CacheParams, signals: Option<Arc<SignalManager>>) -> Self {
        Self {
            inner: Arc::new(Inner {
                entries: Mutex::new(HashMap::new()),
                params,
                signals,
            }),
        }
    }

    pub fn params(&self) -> &CacheParams {
        &self.inner.params
    }

    pub fn signals(&self) -> Option<&Arc<SignalManager>> {
        self.inner.signals.as_ref()
    }

    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn keys(&self) -> Vec<CacheKey> {
        let mut keys: Vec<CacheKey> = self.inner.lock().keys().cloned().collect();
        keys.sort();
        keys
    }

    pub fn contains(&self, key: &CacheKey) -> bool {
        self.inner.lock().contains_key(key)
    }

    /// Current snapshot of an entry
    pub fn get(&self, key: &CacheKey) -> Option<EntrySnapshot> {
        self.inner.lock().get(key).map(CacheEntry::snapshot)
    }

    /// Whether a value younger than `stale_time` is cached for `key`
    pub fn is_fresh(&self, key: &CacheKey, stale_time: Duration) -> bool {
        self.inner
            .lock()
            .get(key)
            .is_some_and(|entry| entry.is_fresh_within(stale_time))
    }

    pub fn subscriber_count(&self, key: &CacheKey) -> usize {
        self.inner
            .lock()
            .get(key)
            .map(|entry| entry.subscribers)
            .unwrap_or(0)
    }

    /// Write a value directly, bypassing the fetch function
    pub fn set(&self, key: &CacheKey, value: CacheValue) {
        let mut events = Vec::new();
        {
            let mut entries = self.inner.lock();
            let entry = entries
                .entry(key.clone())
                .or_insert_with(|| CacheEntry::new(&self.inner.params));
            entry.apply_value(value);
            entry.publish();
            events.push(self.inner.event(EventType::Updated, key, None));

            if entry.subscribers == 0 && entry.gc_task.is_none() {
                self.inner.apply_gc(&mut entries, key, &mut events);
            }
        }
        self.inner.emit_all(events);
    }

    /// Decode the cached value for `key`
    pub fn get_value<T: DeserializeOwned>(&self, key: &CacheKey) -> Result<Option<T>, CacheError> {
        let value = self.inner.lock().get(key).and_then(|entry| entry.value.clone());
        match value {
            Some(value) => Ok(Some(serde_json::from_value(value)?)),
            None => Ok(None),
        }
    }

    pub fn set_value<T: Serialize>(&self, key: &CacheKey, value: &T) -> Result<(), CacheError> {
        let value = serde_json::to_value(value)?;
        self.set(key, value);
        Ok(())
    }

    /// Drop an entry immediately. A fetch still running for it is discarded when it settles.
    pub fn remove(&self, key: &CacheKey) -> bool {
        let removed = self.inner.lock().remove(key);
        match removed {
            Some(entry) => {
                tracing::debug!(key = %key, "cache entry removed");
                drop(entry);
                self.inner
                    .emit_all(vec![self.inner.event(EventType::Removed, key, None)]);
                true
            }
            None => false,
        }
    }

    /// Mark every entry within `scope` stale and refetch the observed ones.
    ///
    /// A fetch already running for an observed entry is superseded by a new one;
    /// the generation guard keeps the older response from overwriting the newer.
    /// A running fetch of an unobserved entry still lands, but leaves the entry stale.
    pub fn invalidate(&self, scope: &CacheKey) -> usize {
        let mut events = Vec::new();
        let mut count = 0;
        {
            let mut entries = self.inner.lock();
            for (key, entry) in entries.iter_mut() {
                if !key.is_within(scope) {
                    continue;
                }
                count += 1;
                entry.invalidated = true;
                entry.invalidated_generation = entry.generation;
                events.push(self.inner.event(EventType::Invalidated, key, None));

                if entry.subscribers > 0 {
                    self.inner.start_fetch(key, entry, true);
                }
                entry.publish();
            }
        }
        tracing::debug!(scope = %scope, count, "cache invalidated");
        self.inner.emit_all(events);
        count
    }

    /// Remove every entry
    pub fn clear(&self) {
        let drained: Vec<(CacheKey, CacheEntry)> = self.inner.lock().drain().collect();
        let events = drained
            .iter()
            .map(|(key, _)| self.inner.event(EventType::Removed, key, None))
            .collect();
        drop(drained);
        self.inner.emit_all(events);
    }

    /// Observe `key`, fetching with `fetcher` unless a fresh value is cached
    /// or a fetch is already running.
    pub fn subscribe(
        &self,
        key: &CacheKey,
        fetcher: Fetcher,
        stale_time: Duration,
        gc_time: Duration,
    ) -> Subscription {
        let (entry_id, receiver) = {
            let mut entries = self.inner.lock();
            let entry = entries
                .entry(key.clone())
                .or_insert_with(|| CacheEntry::new(&self.inner.params));

            entry.cancel_gc();
            entry.subscribers += 1;
            entry.fetcher = Some(fetcher);
            entry.gc_after = gc_time;

            let receiver = entry.notifier.subscribe();
            if entry.in_flight.is_none() && !entry.is_fresh_within(stale_time) {
                self.inner.start_fetch(key, entry, false);
            }
            entry.publish();

            tracing::trace!(key = %key, subscribers = entry.subscribers, "subscribed");
            (entry.id, receiver)
        };

        Subscription::new(key.clone(), entry_id, receiver, self.clone())
    }

    /// Fetch `key` again with its registered fetch function, joining a running fetch if any
    pub fn refetch(&self, key: &CacheKey) -> Option<InFlight> {
        let mut entries = self.inner.lock();
        let entry = entries.get_mut(key)?;
        let in_flight = self.inner.start_fetch(key, entry, false);
        entry.publish();
        in_flight
    }

    /// Return the cached value if fresh, otherwise make sure a fetch is running.
    /// Does not create a subscription.
    pub fn ensure(&self, key: &CacheKey, fetcher: Fetcher, stale_time: Duration) -> EnsureOutcome {
        let mut entries = self.inner.lock();
        let entry = entries
            .entry(key.clone())
            .or_insert_with(|| CacheEntry::new(&self.inner.params));

        if entry.is_fresh_within(stale_time) {
            if let Some(value) = entry.value.clone() {
                return EnsureOutcome::Fresh(value);
            }
        }

        if entry.fetcher.is_none() || entry.subscribers == 0 {
            entry.fetcher = Some(fetcher);
        }
        entry.cancel_gc();
        let in_flight = self.inner.start_fetch(key, entry, false);
        entry.publish();

        match in_flight {
            Some(in_flight) => EnsureOutcome::Fetching(in_flight),
            None => EnsureOutcome::Fetching(
                futures::future::ready(Err(FetchError::new("no fetch function registered")))
                    .boxed()
                    .shared(),
            ),
        }
    }

    /// Called when a [`Subscription`] is dropped
    pub(crate) fn release(&self, key: &CacheKey, entry_id: Uuid) {
        let mut events = Vec::new();
        {
            let mut entries = self.inner.lock();
            let Some(entry) = entries.get_mut(key) else {
                return;
            };
            if entry.id != entry_id {
                return;
            }
            entry.subscribers = entry.subscribers.saturating_sub(1);
            tracing::trace!(key = %key, subscribers = entry.subscribers, "unsubscribed");
            if entry.subscribers == 0 {
                self.inner.apply_gc(&mut entries, key, &mut events);
            }
        }
        self.inner.emit_all(events);
    }
}

impl Inner {
    fn lock(&self) -> MutexGuard<'_, HashMap<CacheKey, CacheEntry>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn event(&self, event_type: EventType, key: &CacheKey, generation: Option<u64>) -> Option<CacheEvent> {
        self.signals.as_ref()?;
        let event = CacheEvent::new(event_type, key.entity(), key.to_string());
        Some(match generation {
            Some(generation) => event.with_generation(generation),
            None => event,
        })
    }

    /// Emit outside of the entry lock so callbacks may use the cache
    fn emit_all(&self, events: Vec<Option<CacheEvent>>) {
        if let Some(signals) = &self.signals {
            for event in events.into_iter().flatten() {
                signals.emit(event);
            }
        }
    }

    /// Start a fetch for `entry`. Without `force` a running fetch is joined instead.
    fn start_fetch(self: &Arc<Self>, key: &CacheKey, entry: &mut CacheEntry, force: bool) -> Option<InFlight> {
        if !force {
            if let Some(in_flight) = &entry.in_flight {
                return Some(in_flight.clone());
            }
        }
        let fetcher = entry.fetcher.clone()?;

        entry.generation += 1;
        let generation = entry.generation;
        if entry.value.is_none() {
            entry.state = EntryState::Pending;
        }
        entry.cancel_gc();

        let weak: Weak<Inner> = Arc::downgrade(self);
        let settle_key = key.clone();
        let entry_id = entry.id;
        let request = fetcher();
        let in_flight = async move {
            let result = request.await;
            if let Some(inner) = weak.upgrade() {
                inner.settle(&settle_key, entry_id, generation, &result);
            }
            result
        }
        .boxed()
        .shared();

        entry.in_flight = Some(in_flight.clone());
        tracing::debug!(key = %key, generation, "fetch started");

        // Drive the fetch even if nobody awaits it
        if let Ok(handle) = Handle::try_current() {
            handle.spawn(in_flight.clone());
        }
        Some(in_flight)
    }

    fn settle(
        self: &Arc<Self>,
        key: &CacheKey,
        entry_id: Uuid,
        generation: u64,
        result: &Result<CacheValue, FetchError>,
    ) {
        let mut events = Vec::new();
        {
            let mut entries = self.lock();
            let Some(entry) = entries.get_mut(key) else {
                tracing::debug!(key = %key, generation, "discarding result for removed entry");
                return;
            };
            if entry.id != entry_id {
                tracing::debug!(key = %key, generation, "discarding result for replaced entry");
                return;
            }

            if entry.generation == generation {
                entry.in_flight = None;
            }

            if generation <= entry.applied_generation {
                tracing::debug!(
                    key = %key,
                    generation,
                    applied = entry.applied_generation,
                    "discarding out-of-order result"
                );
            } else {
                entry.applied_generation = generation;
                match result {
                    Ok(value) => {
                        entry.apply_value(value.clone());
                        events.push(self.event(EventType::Fetched, key, Some(generation)));
                    }
                    Err(error) => {
                        tracing::debug!(key = %key, generation, error = %error, "fetch failed");
                        entry.apply_error(error.clone());
                        events.push(
                            self.event(EventType::FetchFailed, key, Some(generation))
                                .map(|event| {
                                    event.with_payload("error", serde_json::Value::String(error.to_string()))
                                }),
                        );
                    }
                }
                // Started before the invalidation, so the backend may have moved on
                if generation <= entry.invalidated_generation {
                    entry.invalidated = true;
                }
            }
            entry.publish();

            if entry.subscribers == 0 && entry.in_flight.is_none() {
                self.apply_gc(&mut entries, key, &mut events);
            }
        }
        self.emit_all(events);
    }

    fn gc_action(entry: &CacheEntry) -> GcAction {
        if entry.subscribers > 0 || entry.in_flight.is_some() {
            // Re-evaluated when the fetch settles
            GcAction::Keep
        } else if entry.gc_after.is_zero() {
            GcAction::RemoveNow
        } else {
            GcAction::Schedule(entry.gc_after)
        }
    }

    /// Evict now or arm the eviction timer for an unobserved entry
    fn apply_gc(
        self: &Arc<Self>,
        entries: &mut HashMap<CacheKey, CacheEntry>,
        key: &CacheKey,
        events: &mut Vec<Option<CacheEvent>>,
    ) {
        let Some(entry) = entries.get_mut(key) else {
            return;
        };
        match Self::gc_action(entry) {
            GcAction::Keep => {}
            GcAction::RemoveNow => {
                entries.remove(key);
                tracing::debug!(key = %key, "cache entry collected");
                events.push(self.event(EventType::Removed, key, None));
            }
            GcAction::Schedule(delay) => {
                entry.cancel_gc();
                let Ok(handle) = Handle::try_current() else {
                    tracing::trace!(key = %key, "no runtime available, eviction not scheduled");
                    return;
                };
                let weak = Arc::downgrade(self);
                let gc_key = key.clone();
                let entry_id = entry.id;
                entry.gc_task = Some(handle.spawn(async move {
                    tokio::time::sleep(delay).await;
                    if let Some(inner) = weak.upgrade() {
                        inner.collect(&gc_key, entry_id);
                    }
                }));
            }
        }
    }

    fn collect(&self, key: &CacheKey, entry_id: Uuid) {
        let removed = {
            let mut entries = self.lock();
            let eligible = entries.get(key).is_some_and(|entry| {
                entry.id == entry_id && entry.subscribers == 0 && entry.in_flight.is_none()
            });
            if eligible {
                // Detach the timer first; it is the task running this code
                if let Some(entry) = entries.get_mut(key) {
                    entry.gc_task = None;
                }
                entries.remove(key)
            } else {
                None
            }
        };

        if removed.is_some() {
            tracing::debug!(key = %key, "cache entry collected");
            self.emit_all(vec![self.event(EventType::Removed, key, None)]);
        }
    }
}
