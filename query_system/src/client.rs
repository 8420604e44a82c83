//! Query client
//!
//! The client is the entry point for reading through the cache. It turns typed
//! fetch closures into cache fetchers, hands out [`Query`] handles and exposes
//! the imperative cache operations used after writes.

use crate::errors::QueryError;
use crate::mutation::Mutation;
use crate::options::QueryOptions;
use crate::query::{Decoder, Query};
use crate::reactive::ReactiveQuery;
use cache_system::{CacheKey, CacheManager, CacheValue, EnsureOutcome, FetchError, Fetcher};
use futures::FutureExt;
use serde::Serialize;
use serde::de::DeserializeOwned;
use signal_system::Reactive;
use std::error::Error as StdError;
use std::future::Future;
use std::sync::Arc;

/// Cheap-to-clone handle over a shared [`CacheManager`]
#[derive(Clone, Debug)]
pub struct QueryClient {
    cache: CacheManager,
    defaults: QueryOptions,
}

impl QueryClient {
    pub fn new(cache: CacheManager) -> Self {
        let defaults = QueryOptions::default()
            .with_stale_time(cache.params().stale_time)
            .with_gc_time(cache.params().gc_time);
        Self { cache, defaults }
    }

    pub fn with_defaults(cache: CacheManager, defaults: QueryOptions) -> Self {
        Self { cache, defaults }
    }

    pub fn cache(&self) -> &CacheManager {
        &self.cache
    }

    /// Options a query gets unless the caller overrides them
    pub fn default_options(&self) -> QueryOptions {
        self.defaults
    }

    /// Subscribe to `key`, fetching with `fetch` when nothing fresh is cached.
    ///
    /// `fetch` is called synchronously to build the request future and must not
    /// use this client before its first `.await`.
    pub fn query<T, F, Fut, E>(&self, key: CacheKey, fetch: F, options: QueryOptions) -> Query<T>
    where
        T: Serialize + DeserializeOwned + Send + 'static,
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
        E: Into<Box<dyn StdError + Send + Sync + 'static>>,
    {
        let decode = decoder::<T>();
        if !options.enabled {
            tracing::trace!(key = %key, "query disabled");
            return Query::disabled(key, decode, options.placeholder_while_refetching);
        }

        let subscription = self.cache.subscribe(
            &key,
            into_fetcher(fetch, options.retry),
            options.stale_time,
            options.gc_time,
        );
        Query::active(subscription, decode, options.placeholder_while_refetching)
    }

    /// Return the cached value if fresh, otherwise fetch it
    pub async fn fetch_query<T, F, Fut, E>(
        &self,
        key: CacheKey,
        fetch: F,
        options: QueryOptions,
    ) -> Result<T, QueryError>
    where
        T: Serialize + DeserializeOwned + Send + 'static,
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
        E: Into<Box<dyn StdError + Send + Sync + 'static>>,
    {
        let value = match self
            .cache
            .ensure(&key, into_fetcher(fetch, options.retry), options.stale_time)
        {
            EnsureOutcome::Fresh(value) => value,
            EnsureOutcome::Fetching(in_flight) => in_flight.await?,
        };
        serde_json::from_value(value).map_err(|error| QueryError::decode(&key, error))
    }

    /// Warm the cache for `key` without subscribing to it
    pub async fn prefetch<T, F, Fut, E>(
        &self,
        key: CacheKey,
        fetch: F,
        options: QueryOptions,
    ) -> Result<(), QueryError>
    where
        T: Serialize + Send + 'static,
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
        E: Into<Box<dyn StdError + Send + Sync + 'static>>,
    {
        match self
            .cache
            .ensure(&key, into_fetcher(fetch, options.retry), options.stale_time)
        {
            EnsureOutcome::Fresh(_) => {
                tracing::trace!(key = %key, "prefetch skipped, entry is fresh");
                Ok(())
            }
            EnsureOutcome::Fetching(in_flight) => in_flight.await.map(|_| ()).map_err(QueryError::Fetch),
        }
    }

    /// Mark entries within `scope` stale; observed ones refetch immediately
    pub fn invalidate(&self, scope: &CacheKey) -> usize {
        self.cache.invalidate(scope)
    }

    pub fn remove(&self, key: &CacheKey) -> bool {
        self.cache.remove(key)
    }

    pub fn set_query_data<T: Serialize>(&self, key: &CacheKey, data: &T) -> Result<(), QueryError> {
        self.cache.set_value(key, data)?;
        Ok(())
    }

    pub fn get_query_data<T: DeserializeOwned>(&self, key: &CacheKey) -> Result<Option<T>, QueryError> {
        match self.cache.get(key).and_then(|snapshot| snapshot.value) {
            Some(value) => serde_json::from_value(value)
                .map(Some)
                .map_err(|error| QueryError::decode(key, error)),
            None => Ok(None),
        }
    }

    /// Build a mutation around `mutate`
    pub fn mutation<I, O, F, Fut, E>(&self, mutate: F) -> Mutation<I, O>
    where
        I: Clone + Send + Sync + 'static,
        O: Clone + Send + Sync + 'static,
        F: Fn(I) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<O, E>> + Send + 'static,
        E: Into<Box<dyn StdError + Send + Sync + 'static>>,
    {
        Mutation::new(mutate)
    }

    /// Follow a query whose key is derived from a reactive input
    pub fn watch<P, T, B>(&self, input: &Reactive<P>, build: B) -> ReactiveQuery<T>
    where
        P: Clone + PartialEq + Send + Sync + 'static,
        T: Clone + Send + Sync + 'static,
        B: Fn(&QueryClient, &P) -> Query<T> + Send + 'static,
    {
        let client = self.clone();
        ReactiveQuery::new(input, move |value| build(&client, value))
    }
}

fn decoder<T: DeserializeOwned + 'static>() -> Decoder<T> {
    Arc::new(|value: &CacheValue| T::deserialize(value))
}

/// Wrap a typed fetch closure into a cache fetcher, retrying failures `retry` times
fn into_fetcher<T, F, Fut, E>(fetch: F, retry: u32) -> Fetcher
where
    T: Serialize + Send + 'static,
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<T, E>> + Send + 'static,
    E: Into<Box<dyn StdError + Send + Sync + 'static>>,
{
    let fetch = Arc::new(fetch);
    Arc::new(move || {
        let fetch = Arc::clone(&fetch);
        async move {
            let mut attempt = 0;
            loop {
                match (*fetch)().await {
                    Ok(data) => return serde_json::to_value(data).map_err(FetchError::new),
                    Err(error) if attempt < retry => {
                        attempt += 1;
                        let error = FetchError::new(error);
                        tracing::debug!(attempt, retry, error = %error, "retrying failed fetch");
                    }
                    Err(error) => return Err(FetchError::new(error)),
                }
            }
        }
        .boxed()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use cache_system::{CacheParams, QueryKeys};
    use serde::Deserialize;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct User {
        id: u32,
        name: String,
    }

    fn client() -> QueryClient {
        QueryClient::new(CacheManager::new(CacheParams::new(
            Duration::from_secs(60),
            Duration::from_secs(120),
        )))
    }

    fn user_fetch(
        calls: Arc<AtomicUsize>,
    ) -> impl Fn() -> futures::future::BoxFuture<'static, anyhow::Result<User>> + Send + Sync + 'static {
        move || {
            let calls = Arc::clone(&calls);
            async move {
                let n = calls.fetch_add(1, Ordering::SeqCst) as u32 + 1;
                tokio::time::sleep(Duration::from_millis(10)).await;
                Ok(User {
                    id: 1,
                    name: format!("user {n}"),
                })
            }
            .boxed()
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_query_lifecycle() {
        let client = client();
        let calls = Arc::new(AtomicUsize::new(0));
        let key = QueryKeys::new("users").details("1");

        let mut query = client.query(key.clone(), user_fetch(calls.clone()), client.default_options());
        let loading = query.result();
        assert!(loading.is_loading());
        assert!(loading.data.is_none());

        let loaded = query.settled().await;
        assert!(loaded.is_success());
        assert!(!loaded.is_loading());
        assert_eq!(loaded.data.map(|u| u.name), Some("user 1".to_string()));
        assert!(loaded.updated_at.is_some());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    // Debug is available for any payload type, without a 'static bound
    fn describe<T>(query: &Query<T>) -> String {
        format!("{query:?}")
    }

    #[tokio::test(start_paused = true)]
    async fn test_disabled_query_touches_nothing() {
        let client = client();
        let calls = Arc::new(AtomicUsize::new(0));
        let key = QueryKeys::new("users").details("");

        let query = client.query(
            key.clone(),
            user_fetch(calls.clone()),
            client.default_options().enabled(false),
        );
        let result = query.result();

        assert_eq!(result.status, crate::query::QueryStatus::Idle);
        assert!(!result.is_loading());
        assert!(result.data.is_none());
        assert!(!client.cache().contains(&key));
        assert!(describe(&query).contains("enabled: false"));
        query.refetch().await.expect("no-op");
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stale_data_is_flagged_as_placeholder_while_refetching() {
        let client = client();
        let calls = Arc::new(AtomicUsize::new(0));
        let key = QueryKeys::new("users").details("1");
        let options = client.default_options().with_stale_time(Duration::ZERO);

        let mut first = client.query(key.clone(), user_fetch(calls.clone()), options);
        first.settled().await;
        drop(first);

        let mut second = client.query(key.clone(), user_fetch(calls.clone()), options);
        let refetching = second.result();
        assert!(refetching.is_fetching);
        assert!(refetching.is_placeholder_data);
        assert_eq!(refetching.data.map(|u| u.name), Some("user 1".to_string()));

        let refreshed = second.settled().await;
        assert!(!refreshed.is_placeholder_data);
        assert_eq!(refreshed.data.map(|u| u.name), Some("user 2".to_string()));
    }

    #[tokio::test(start_paused = true)]
    async fn test_select_projects_without_touching_cache() {
        let client = client();
        let calls = Arc::new(AtomicUsize::new(0));
        let key = QueryKeys::new("users").details("1");

        let mut names = client
            .query(key.clone(), user_fetch(calls), client.default_options())
            .select(|user: &User| user.name.to_uppercase());

        let result = names.settled().await;
        assert_eq!(result.data.as_deref(), Some("USER 1"));

        let cached: Option<User> = client.get_query_data(&key).expect("decodable");
        assert_eq!(cached.map(|u| u.name), Some("user 1".to_string()));
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_then_surface_error() {
        let client = client();
        let attempts = Arc::new(AtomicUsize::new(0));
        let key = QueryKeys::new("users").details("2");

        let fetch = {
            let attempts = Arc::clone(&attempts);
            move || {
                let attempts = Arc::clone(&attempts);
                async move {
                    attempts.fetch_add(1, Ordering::SeqCst);
                    Err::<User, _>(anyhow::anyhow!("upstream timeout"))
                }
            }
        };

        let error = client
            .fetch_query(key.clone(), fetch, client.default_options().with_retry(2))
            .await
            .expect_err("every attempt fails");

        assert_eq!(attempts.load(Ordering::SeqCst), 3);
        assert_eq!(error.to_string(), "upstream timeout");
        let snapshot = client.cache().get(&key).expect("entry kept until collected");
        assert!(snapshot.error.is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn test_fetch_query_serves_fresh_value() {
        let client = client();
        let calls = Arc::new(AtomicUsize::new(0));
        let key = QueryKeys::new("users").details("1");

        let first: User = client
            .fetch_query(key.clone(), user_fetch(calls.clone()), client.default_options())
            .await
            .expect("fetched");
        let second: User = client
            .fetch_query(key.clone(), user_fetch(calls.clone()), client.default_options())
            .await
            .expect("cached");

        assert_eq!(first, second);
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        client
            .prefetch(key.clone(), user_fetch(calls.clone()), client.default_options())
            .await
            .expect("fresh, nothing to do");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_set_and_get_query_data() {
        let client = client();
        let key = QueryKeys::new("users").details("3");
        let user = User {
            id: 3,
            name: "manual".into(),
        };

        client.set_query_data(&key, &user).expect("serializable");
        assert_eq!(client.get_query_data::<User>(&key).expect("decodable"), Some(user));

        let wrong_shape = client.get_query_data::<Vec<u32>>(&key);
        assert!(matches!(wrong_shape, Err(QueryError::Decode { .. })));

        assert!(client.remove(&key));
        assert_eq!(client.get_query_data::<User>(&key).expect("absent"), None);
    }
}
