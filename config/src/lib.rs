//! # Configuration Management for QueryHaus
//!
//! This crate provides centralized configuration structures for all QueryHaus components,
//! including transport, cache and signal system settings.
//!
//! ## Quick Start
//!
//! ### Programmatic Configuration
//! ```rust
//! use config::{CacheConfig, SignalConfig, TransportConfig};
//!
//! // Transport configuration
//! let transport_config = TransportConfig::new(
//!     "http://localhost:3000".to_string(),
//!     30_000,
//!     "X-Total-Count".to_string(),
//! );
//!
//! // Cache configuration
//! let cache_config = CacheConfig::new(300_000, 600_000, 0, true);
//!
//! // Signal configuration
//! let signal_config = SignalConfig::new(100);
//! ```
//!
//! ### TOML File Configuration
//! ```toml
//! [transport]
//! base_url = "http://localhost:3000"
//! timeout_ms = 30000
//! total_count_header = "X-Total-Count"
//!
//! [cache]
//! stale_time_ms = 300000
//! gc_time_ms = 600000
//! retry = 0
//! placeholder_while_refetching = true
//!
//! [signal]
//! max_callbacks = 100
//! ```
//!
//! Load configuration:
//! ```rust,no_run
//! use config::AppConfig;
//!
//! // Load from queryhaus.toml
//! let config = AppConfig::load()?;
//!
//! // Or load from custom path
//! let config = AppConfig::from_file("config/production.toml")?;
//! # Ok::<(), config::ConfigError>(())
//! ```

use serde::{Deserialize, Serialize};
use std::{env, path::Path, time::Duration};
use thiserror::Error;

const DEFAULT_CONFIG_PATH: &str = "./queryhaus.toml";
const CONFIG_PATH_VAR: &str = "QUERYHAUS_CONFIG";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Dotenvy error: {0}")]
    Dotenvy(#[from] dotenvy::Error),
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Complete application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub transport: TransportConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub signal: SignalConfig,
}

/// Backend transport configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TransportConfig {
    /// Base URL every entity path is resolved against (http://localhost:3000)
    pub base_url: String,
    /// Per-request timeout in milliseconds
    pub timeout_ms: u64,
    /// Response header carrying the total row count of a list endpoint
    pub total_count_header: String,
}

/// Query cache configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// How long fetched data is considered fresh
    pub stale_time_ms: u64,
    /// How long an unobserved entry is kept before eviction
    pub gc_time_ms: u64,
    /// Extra attempts after a failed fetch
    pub retry: u32,
    /// Keep showing previous data while a refetch is in flight
    pub placeholder_while_refetching: bool,
}

/// Signal system configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SignalConfig {
    pub max_callbacks: usize,
}

impl AppConfig {
    /// Load configuration from TOML file specified in .env or defaults
    pub fn load() -> Result<Self, ConfigError> {
        if let Err(e) = dotenvy::dotenv() {
            if !e.not_found() {
                return Err(e.into());
            }
        }

        // Try QUERYHAUS_CONFIG first, then DEFAULT_CONFIG_PATH
        if let Ok(config_path) = env::var(CONFIG_PATH_VAR) {
            Self::from_file(&config_path)
        } else if Path::new(DEFAULT_CONFIG_PATH).exists() {
            Self::from_file(DEFAULT_CONFIG_PATH)
        } else {
            Err(ConfigError::Invalid(format!(
                "Config path must be specified in .env file as {} or in {} file",
                CONFIG_PATH_VAR, DEFAULT_CONFIG_PATH
            )))
        }
    }

    /// Load configuration from TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Parse configuration from TOML source
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), ConfigError> {
        // Transport validations
        let base_url = self.transport.base_url.trim();
        if base_url.is_empty() {
            return Err(ConfigError::Invalid(
                "Transport base_url cannot be empty".to_string(),
            ));
        }
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(ConfigError::Invalid(format!(
                "Transport base_url must start with http:// or https://, got '{}'",
                base_url
            )));
        }
        if self.transport.timeout_ms == 0 {
            return Err(ConfigError::Invalid(
                "Transport timeout_ms must be greater than 0".to_string(),
            ));
        }
        if self.transport.total_count_header.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "Transport total_count_header cannot be empty".to_string(),
            ));
        }

        // Signal validations
        if self.signal.max_callbacks == 0 {
            return Err(ConfigError::Invalid(
                "Signal max_callbacks must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}

impl TransportConfig {
    /// Create a new transport configuration
    pub fn new(base_url: String, timeout_ms: u64, total_count_header: String) -> Self {
        Self {
            base_url,
            timeout_ms,
            total_count_header,
        }
    }

    /// Get timeout as Duration
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:3000".to_string(),
            timeout_ms: 30_000,
            total_count_header: "X-Total-Count".to_string(),
        }
    }
}

impl CacheConfig {
    /// Create a new cache configuration
    pub fn new(
        stale_time_ms: u64,
        gc_time_ms: u64,
        retry: u32,
        placeholder_while_refetching: bool,
    ) -> Self {
        Self {
            stale_time_ms,
            gc_time_ms,
            retry,
            placeholder_while_refetching,
        }
    }

    pub fn stale_time(&self) -> Duration {
        Duration::from_millis(self.stale_time_ms)
    }

    pub fn gc_time(&self) -> Duration {
        Duration::from_millis(self.gc_time_ms)
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            stale_time_ms: 1000 * 60 * 5, // 5 minutes
            gc_time_ms: 1000 * 60 * 10,   // 10 minutes
            retry: 0,
            placeholder_while_refetching: true,
        }
    }
}

impl SignalConfig {
    /// Create a new signal configuration
    pub fn new(max_callbacks: usize) -> Self {
        Self { max_callbacks }
    }
}

impl Default for SignalConfig {
    fn default() -> Self {
        Self { max_callbacks: 100 }
    }
}
