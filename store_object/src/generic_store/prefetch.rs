//! Next-page prefetching
//!
//! Prefetching warms the cache for the page after the current one. It never
//! subscribes, so the current page's query state is left alone, and its
//! failures are only logged.

use super::core::Repository;
use crate::query_builder::RequestOptions;
use crate::traits::model::Model;
use tokio::task::JoinHandle;

impl<T: Model> Repository<T> {
    /// Fetch the page after `options` unless it is already cached and fresh
    pub async fn prefetch_next_page(&self, options: &RequestOptions) {
        let next = options.next_page();
        let key = self.keys.list(Some(&next));

        let result = self
            .client
            .prefetch(key.clone(), self.page_fetcher(&next), self.page_options(&next))
            .await;

        match result {
            Ok(()) => tracing::trace!(key = %key, "next page prefetched"),
            Err(error) => tracing::warn!(
                entity = %self.entity,
                key = %key,
                error = %error,
                "failed to prefetch next page"
            ),
        }
    }

    /// Fire-and-forget variant of [`Repository::prefetch_next_page`]
    pub fn spawn_prefetch_next_page(&self, options: &RequestOptions) -> JoinHandle<()> {
        let repository = self.clone();
        let options = options.clone();
        tokio::spawn(async move { repository.prefetch_next_page(&options).await })
    }
}
