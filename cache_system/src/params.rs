//! Cache parameter configuration
//!
//! This module defines the CacheParams struct
//! for configuring freshness and eviction timing.

use config::CacheConfig;
use std::time::Duration;

/// Timing parameters applied to cache entries
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheParams {
    /// Age after which an entry is refetched on access
    pub stale_time: Duration,
    /// Delay between the last subscriber detaching and eviction
    pub gc_time: Duration,
}

impl CacheParams {
    pub fn new(stale_time: Duration, gc_time: Duration) -> Self {
        Self { stale_time, gc_time }
    }

    pub fn with_stale_time(mut self, stale_time: Duration) -> Self {
        self.stale_time = stale_time;
        self
    }

    pub fn with_gc_time(mut self, gc_time: Duration) -> Self {
        self.gc_time = gc_time;
        self
    }
}

impl From<&CacheConfig> for CacheParams {
    fn from(config: &CacheConfig) -> Self {
        Self::new(config.stale_time(), config.gc_time())
    }
}

impl Default for CacheParams {
    fn default() -> Self {
        Self::from(&CacheConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_follow_cache_config() {
        let params = CacheParams::default();
        assert_eq!(params.stale_time, Duration::from_secs(300));
        assert_eq!(params.gc_time, Duration::from_secs(600));

        let tuned = params.with_stale_time(Duration::ZERO).with_gc_time(Duration::from_secs(1));
        assert_eq!(tuned, CacheParams::new(Duration::ZERO, Duration::from_secs(1)));
    }
}
