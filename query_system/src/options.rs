//! Per-query options

use config::CacheConfig;
use std::time::Duration;

/// Options controlling freshness, eviction and retry of a query
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryOptions {
    pub stale_time: Duration,
    pub gc_time: Duration,
    /// Flag data served during a refetch as placeholder data
    pub placeholder_while_refetching: bool,
    /// A disabled query never fetches and never touches the cache
    pub enabled: bool,
    /// Extra attempts after a failed fetch
    pub retry: u32,
}

impl QueryOptions {
    pub fn from_config(config: &CacheConfig) -> Self {
        Self {
            stale_time: config.stale_time(),
            gc_time: config.gc_time(),
            placeholder_while_refetching: config.placeholder_while_refetching,
            enabled: true,
            retry: config.retry,
        }
    }

    pub fn with_stale_time(mut self, stale_time: Duration) -> Self {
        self.stale_time = stale_time;
        self
    }

    pub fn with_gc_time(mut self, gc_time: Duration) -> Self {
        self.gc_time = gc_time;
        self
    }

    pub fn with_placeholder(mut self, placeholder_while_refetching: bool) -> Self {
        self.placeholder_while_refetching = placeholder_while_refetching;
        self
    }

    pub fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    pub fn with_retry(mut self, retry: u32) -> Self {
        self.retry = retry;
        self
    }
}

impl Default for QueryOptions {
    fn default() -> Self {
        Self::from_config(&CacheConfig::default())
    }
}
