//! Query handles and their observable results

use crate::errors::QueryError;
use cache_system::{CacheKey, CacheValue, EntrySnapshot, EntryState, Subscription};
use chrono::{DateTime, Utc};
use std::sync::Arc;

pub(crate) type Decoder<T> = Arc<dyn Fn(&CacheValue) -> Result<T, serde_json::Error> + Send + Sync>;

/// Lifecycle status reported to consumers
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum QueryStatus {
    #[default]
    Idle,
    Pending,
    Success,
    Error,
}

impl From<EntryState> for QueryStatus {
    fn from(state: EntryState) -> Self {
        match state {
            EntryState::Idle => QueryStatus::Idle,
            EntryState::Pending => QueryStatus::Pending,
            EntryState::Success => QueryStatus::Success,
            EntryState::Error => QueryStatus::Error,
        }
    }
}

/// What a consumer sees for a query at one point in time
#[derive(Debug, Clone)]
pub struct QueryResult<T> {
    pub status: QueryStatus,
    pub data: Option<T>,
    pub error: Option<QueryError>,
    pub is_fetching: bool,
    /// `data` is being shown while a newer value is fetched
    pub is_placeholder_data: bool,
    pub updated_at: Option<DateTime<Utc>>,
}

impl<T> QueryResult<T> {
    pub fn idle() -> Self {
        Self {
            status: QueryStatus::Idle,
            data: None,
            error: None,
            is_fetching: false,
            is_placeholder_data: false,
            updated_at: None,
        }
    }

    /// First load in progress
    pub fn is_loading(&self) -> bool {
        self.status == QueryStatus::Pending && self.is_fetching
    }

    pub fn is_success(&self) -> bool {
        self.status == QueryStatus::Success
    }

    pub fn is_error(&self) -> bool {
        self.status == QueryStatus::Error
    }

    pub fn map<U, F>(self, f: F) -> QueryResult<U>
    where
        F: FnOnce(T) -> U,
    {
        QueryResult {
            status: self.status,
            data: self.data.map(f),
            error: self.error,
            is_fetching: self.is_fetching,
            is_placeholder_data: self.is_placeholder_data,
            updated_at: self.updated_at,
        }
    }
}

impl<T> Default for QueryResult<T> {
    fn default() -> Self {
        Self::idle()
    }
}

enum Source {
    Active(Subscription),
    Disabled,
}

/// Handle to a cached query; keeps its entry alive until dropped
pub struct Query<T> {
    key: CacheKey,
    source: Source,
    decode: Decoder<T>,
    placeholder: bool,
}

impl<T> std::fmt::Debug for Query<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Query")
            .field("key", &self.key)
            .field("enabled", &matches!(self.source, Source::Active(_)))
            .field("placeholder", &self.placeholder)
            .finish()
    }
}

impl<T: 'static> Query<T> {
    pub(crate) fn active(subscription: Subscription, decode: Decoder<T>, placeholder: bool) -> Self {
        Self {
            key: subscription.key().clone(),
            source: Source::Active(subscription),
            decode,
            placeholder,
        }
    }

    pub(crate) fn disabled(key: CacheKey, decode: Decoder<T>, placeholder: bool) -> Self {
        Self {
            key,
            source: Source::Disabled,
            decode,
            placeholder,
        }
    }

    pub fn key(&self) -> &CacheKey {
        &self.key
    }

    pub fn is_enabled(&self) -> bool {
        matches!(self.source, Source::Active(_))
    }

    pub fn placeholder_while_refetching(&self) -> bool {
        self.placeholder
    }

    /// Current result, decoded from the cached value
    pub fn result(&self) -> QueryResult<T> {
        match &self.source {
            Source::Active(subscription) => self.to_result(subscription.snapshot()),
            Source::Disabled => QueryResult::idle(),
        }
    }

    fn to_result(&self, snapshot: EntrySnapshot) -> QueryResult<T> {
        let mut result = QueryResult {
            status: snapshot.state.into(),
            data: None,
            error: snapshot.error.map(QueryError::Fetch),
            is_fetching: snapshot.is_fetching,
            is_placeholder_data: false,
            updated_at: snapshot.updated_at,
        };

        if let Some(value) = &snapshot.value {
            match (self.decode)(value) {
                Ok(data) => {
                    result.is_placeholder_data = self.placeholder && snapshot.is_fetching;
                    result.data = Some(data);
                }
                Err(error) => {
                    result.status = QueryStatus::Error;
                    result.error = Some(QueryError::decode(&self.key, error));
                }
            }
        }
        result
    }

    /// Wait for the next change. Returns false once the entry is gone;
    /// a disabled query never changes.
    pub async fn changed(&mut self) -> bool {
        match &mut self.source {
            Source::Active(subscription) => subscription.changed().await,
            Source::Disabled => futures::future::pending::<bool>().await,
        }
    }

    /// Wait until no fetch is running and return the result
    pub async fn settled(&mut self) -> QueryResult<T> {
        match &mut self.source {
            Source::Active(subscription) => {
                let snapshot = subscription.settled().await;
                self.to_result(snapshot)
            }
            Source::Disabled => QueryResult::idle(),
        }
    }

    /// Fetch again and wait for it. A disabled query does nothing.
    pub async fn refetch(&self) -> Result<(), QueryError> {
        let Source::Active(subscription) = &self.source else {
            return Ok(());
        };
        let in_flight = subscription.refetch().ok_or(QueryError::Cancelled)?;
        in_flight.await.map(|_| ()).map_err(QueryError::Fetch)
    }

    /// Project the decoded value; the cached value is left untouched
    pub fn select<U, F>(self, f: F) -> Query<U>
    where
        U: 'static,
        F: Fn(&T) -> U + Send + Sync + 'static,
    {
        let decode = self.decode;
        Query {
            key: self.key,
            source: self.source,
            decode: Arc::new(move |value: &CacheValue| decode(value).map(|data| f(&data))),
            placeholder: self.placeholder,
        }
    }
}
