//! Queries keyed by reactive inputs
//!
//! A [`ReactiveQuery`] rebuilds its query whenever the input value changes.
//! While the query for the new key has no data yet, the last data of the
//! previous key is shown as placeholder data.

use crate::query::{Query, QueryResult, QueryStatus};
use signal_system::{Reactive, ReactiveVersion};
use tokio::sync::watch;
use tokio::task::JoinHandle;

pub struct ReactiveQuery<T> {
    receiver: watch::Receiver<QueryResult<T>>,
    /// Input version whose query the driver has published
    applied: watch::Receiver<u64>,
    input_version: ReactiveVersion,
    driver: JoinHandle<()>,
}

impl<T> std::fmt::Debug for ReactiveQuery<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReactiveQuery")
            .field("running", &!self.driver.is_finished())
            .finish()
    }
}

impl<T> ReactiveQuery<T>
where
    T: Clone + Send + Sync + 'static,
{
    /// Must be called from within a tokio runtime
    pub fn new<P, B>(input: &Reactive<P>, build: B) -> Self
    where
        P: Clone + PartialEq + Send + Sync + 'static,
        B: Fn(&P) -> Query<T> + Send + 'static,
    {
        let input_version = input.version_handle();
        let versions = input_version.clone();
        let mut inputs = input.subscribe();
        let (initial, initial_version) = {
            let value = inputs.borrow_and_update();
            (value.clone(), versions.current())
        };
        let mut query = build(&initial);
        let (sender, receiver) = watch::channel(query.result());
        let (applied_sender, applied) = watch::channel(initial_version);

        let driver = tokio::spawn(async move {
            let mut previous: Option<T> = None;
            let mut inputs_open = true;
            let mut applied_version: Option<u64> = None;
            let mut query_open = true;

            while inputs_open || query_open {
                tokio::select! {
                    changed = inputs.changed(), if inputs_open => {
                        if changed.is_err() {
                            inputs_open = false;
                            continue;
                        }
                        let (value, version) = {
                            let value = inputs.borrow_and_update();
                            (value.clone(), versions.current())
                        };
                        applied_version = Some(version);
                        if let Some(data) = sender.borrow().data.clone() {
                            previous = Some(data);
                        }
                        query = build(&value);
                        query_open = true;
                        tracing::trace!(key = %query.key(), "reactive input changed");
                    }
                    alive = query.changed(), if query_open => {
                        query_open = alive;
                    }
                }

                let mut result = query.result();
                if result.data.is_some() {
                    previous = None;
                } else if result.status == QueryStatus::Pending && query.placeholder_while_refetching() {
                    if let Some(data) = &previous {
                        result.data = Some(data.clone());
                        result.is_placeholder_data = true;
                    }
                }
                sender.send_replace(result);
                if let Some(version) = applied_version.take() {
                    applied_sender.send_replace(version);
                }
            }
        });

        Self {
            receiver,
            applied,
            input_version,
            driver,
        }
    }

    pub fn result(&self) -> QueryResult<T> {
        self.receiver.borrow().clone()
    }

    /// Wait for the next published result. Returns false once the driver stopped.
    pub async fn changed(&mut self) -> bool {
        self.receiver.changed().await.is_ok()
    }

    /// Wait until the query for the latest input value has finished fetching.
    ///
    /// An input change made before the call is always awaited, even if the
    /// driver has not picked it up yet.
    pub async fn settled(&mut self) -> QueryResult<T> {
        let target = self.input_version.current();
        // Err only when the driver stopped; the last published result is final then
        let _ = self.applied.wait_for(|applied| *applied >= target).await;
        if let Ok(result) = self.receiver.wait_for(|result| !result.is_fetching).await {
            return result.clone();
        }
        self.receiver.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<QueryResult<T>> {
        self.receiver.clone()
    }
}

impl<T> Drop for ReactiveQuery<T> {
    fn drop(&mut self) {
        self.driver.abort();
    }
}

#[cfg(test)]
mod tests {
    use crate::client::QueryClient;
    use cache_system::{CacheManager, CacheParams, QueryKeys};
    use signal_system::Reactive;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[derive(Debug, Clone, PartialEq)]
    struct PageOptions {
        page: u32,
    }

    #[tokio::test(start_paused = true)]
    async fn test_rekeys_on_change_with_previous_data_as_placeholder() {
        let client = QueryClient::new(CacheManager::new(CacheParams::new(
            Duration::from_secs(60),
            Duration::from_secs(120),
        )));
        let calls = Arc::new(AtomicUsize::new(0));
        let options = Reactive::new(PageOptions { page: 0 });

        let mut pages = {
            let calls = Arc::clone(&calls);
            client.watch(&options, move |client, options: &PageOptions| {
                let page = options.page;
                let calls = Arc::clone(&calls);
                client.query(
                    QueryKeys::new("users").list(Some(&page)),
                    move || {
                        calls.fetch_add(1, Ordering::SeqCst);
                        async move {
                            tokio::time::sleep(Duration::from_millis(50)).await;
                            Ok::<_, anyhow::Error>(vec![format!("page {page}")])
                        }
                    },
                    client.default_options(),
                )
            })
        };

        let first = pages.settled().await;
        assert_eq!(first.data, Some(vec!["page 0".to_string()]));

        // Equal value: no new key, no request
        assert!(!options.set(PageOptions { page: 0 }));

        assert!(options.set(PageOptions { page: 1 }));
        let switching = loop {
            pages.changed().await;
            let result = pages.result();
            if result.is_fetching {
                break result;
            }
        };
        assert!(switching.is_placeholder_data);
        assert_eq!(switching.data, Some(vec!["page 0".to_string()]));

        let second = pages.settled().await;
        assert!(!second.is_placeholder_data);
        assert_eq!(second.data, Some(vec!["page 1".to_string()]));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_settled_right_after_set_waits_for_new_key() {
        let client = QueryClient::new(CacheManager::new(CacheParams::new(
            Duration::from_secs(60),
            Duration::from_secs(120),
        )));
        let options = Reactive::new(PageOptions { page: 0 });

        let mut pages = client.watch(&options, |client, options: &PageOptions| {
            let page = options.page;
            client.query(
                QueryKeys::new("users").list(Some(&page)),
                move || async move {
                    tokio::time::sleep(Duration::from_millis(50)).await;
                    Ok::<_, anyhow::Error>(vec![format!("page {page}")])
                },
                client.default_options(),
            )
        });
        pages.settled().await;

        // The driver has not seen the change yet when settled is called
        assert!(options.set(PageOptions { page: 1 }));
        let result = pages.settled().await;
        assert!(!result.is_placeholder_data);
        assert_eq!(result.data, Some(vec!["page 1".to_string()]));

        assert!(options.set(PageOptions { page: 2 }));
        assert!(options.set(PageOptions { page: 0 }));
        let result = pages.settled().await;
        assert_eq!(result.data, Some(vec!["page 0".to_string()]));
    }
}
