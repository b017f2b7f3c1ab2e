//! Configuration for the upstream HTTP clients

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Default primary (session-level) API endpoint
pub const DEFAULT_PRIMARY_BASE_URL: &str = "https://api.openf1.org/v1";

/// Default secondary (historical) API endpoint
pub const DEFAULT_SECONDARY_BASE_URL: &str = "https://api.jolpi.ca/ergast/f1";

/// Configuration shared by both HTTP adapters
///
/// # Examples
///
/// ```
/// use paddock_sources::SourcesConfig;
///
/// let config = SourcesConfig::default();
/// assert_eq!(config.max_retries, 3);
/// assert!(config.response_cache_dir.is_none());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourcesConfig {
    /// Primary provider base URL
    #[serde(default = "default_primary_base_url")]
    pub primary_base_url: String,

    /// Secondary provider base URL
    #[serde(default = "default_secondary_base_url")]
    pub secondary_base_url: String,

    /// Per-request timeout (seconds)
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Attempts per request before giving up
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// First backoff delay (milliseconds), doubled on every retry
    #[serde(default = "default_retry_base_delay_ms")]
    pub retry_base_delay_ms: u64,

    /// Directory for the on-disk response cache; disabled when absent
    #[serde(default)]
    pub response_cache_dir: Option<PathBuf>,

    /// Maximum age of a cached response (seconds); no limit when absent
    #[serde(default)]
    pub response_cache_ttl_secs: Option<u64>,

    /// Request budget against the secondary provider
    #[serde(default = "default_secondary_requests_per_second")]
    pub secondary_requests_per_second: u32,
}

fn default_primary_base_url() -> String {
    DEFAULT_PRIMARY_BASE_URL.to_string()
}

fn default_secondary_base_url() -> String {
    DEFAULT_SECONDARY_BASE_URL.to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_max_retries() -> u32 {
    3
}

fn default_retry_base_delay_ms() -> u64 {
    1000
}

fn default_secondary_requests_per_second() -> u32 {
    4
}

impl Default for SourcesConfig {
    fn default() -> Self {
        Self {
            primary_base_url: default_primary_base_url(),
            secondary_base_url: default_secondary_base_url(),
            timeout_secs: default_timeout_secs(),
            max_retries: default_max_retries(),
            retry_base_delay_ms: default_retry_base_delay_ms(),
            response_cache_dir: None,
            response_cache_ttl_secs: None,
            secondary_requests_per_second: default_secondary_requests_per_second(),
        }
    }
}

impl SourcesConfig {
    /// Get the request timeout as a Duration
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Get the first retry delay as a Duration
    pub fn retry_base_delay(&self) -> Duration {
        Duration::from_millis(self.retry_base_delay_ms)
    }

    /// Get the response cache TTL as a Duration
    pub fn response_cache_ttl(&self) -> Option<Duration> {
        self.response_cache_ttl_secs.map(Duration::from_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = SourcesConfig::default();
        assert_eq!(config.primary_base_url, DEFAULT_PRIMARY_BASE_URL);
        assert_eq!(config.secondary_base_url, DEFAULT_SECONDARY_BASE_URL);
        assert_eq!(config.timeout(), Duration::from_secs(30));
        assert_eq!(config.retry_base_delay(), Duration::from_millis(1000));
        assert_eq!(config.secondary_requests_per_second, 4);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: SourcesConfig =
            serde_json::from_str(r#"{"secondary_base_url": "http://localhost:8000/ergast/f1"}"#)
                .unwrap();
        assert_eq!(config.secondary_base_url, "http://localhost:8000/ergast/f1");
        assert_eq!(config.max_retries, 3);
        assert_eq!(config.response_cache_ttl(), None);
    }
}
