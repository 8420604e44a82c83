//! Live observation of a single cache entry

use crate::entry::{EntrySnapshot, InFlight};
use crate::keys::CacheKey;
use crate::manager::CacheManager;
use tokio::sync::watch;
use uuid::Uuid;

/// Keeps an entry alive and observes its changes.
///
/// Dropping the subscription detaches it; once the last one is gone the entry
/// is evicted after its GC time.
pub struct Subscription {
    key: CacheKey,
    entry_id: Uuid,
    receiver: watch::Receiver<EntrySnapshot>,
    cache: CacheManager,
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("key", &self.key)
            .field("entry_id", &self.entry_id)
            .finish()
    }
}

impl Subscription {
    pub(crate) fn new(
        key: CacheKey,
        entry_id: Uuid,
        receiver: watch::Receiver<EntrySnapshot>,
        cache: CacheManager,
    ) -> Self {
        Self {
            key,
            entry_id,
            receiver,
            cache,
        }
    }

    pub fn key(&self) -> &CacheKey {
        &self.key
    }

    pub fn cache(&self) -> &CacheManager {
        &self.cache
    }

    pub fn snapshot(&self) -> EntrySnapshot {
        self.receiver.borrow().clone()
    }

    /// Wait for the next change. Returns false once the entry has been removed.
    pub async fn changed(&mut self) -> bool {
        self.receiver.changed().await.is_ok()
    }

    /// Wait until no fetch is running for the entry
    pub async fn settled(&mut self) -> EntrySnapshot {
        if let Ok(snapshot) = self.receiver.wait_for(|snapshot| !snapshot.is_fetching).await {
            return snapshot.clone();
        }
        self.receiver.borrow().clone()
    }

    /// Fetch again, joining a running fetch if there is one
    pub fn refetch(&self) -> Option<InFlight> {
        self.cache.refetch(&self.key)
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.cache.release(&self.key, self.entry_id);
    }
}
