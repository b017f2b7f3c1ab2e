//! Configuration for the cache coordinator
//!
//! Defines entry lifetime, the bound on waiting for an in-flight build, and
//! the janitor sweep interval.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for the season cache
///
/// # Examples
///
/// ```
/// use paddock_cache::CacheConfig;
///
/// // Default configuration: one day per entry
/// let config = CacheConfig::default();
/// assert_eq!(config.ttl_secs, 86_400);
///
/// // Aggressive expiry
/// let config = CacheConfig::aggressive();
/// assert_eq!(config.ttl_secs, 6 * 3600);
///
/// // Lenient expiry
/// let config = CacheConfig::lenient();
/// assert_eq!(config.ttl_secs, 7 * 86_400);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Lifetime of a built payload, in both tiers (seconds)
    /// Default: 24 hours
    #[serde(default = "default_ttl_secs")]
    pub ttl_secs: u64,

    /// How long a request waits for an in-flight build (milliseconds)
    /// Default: 30 seconds
    #[serde(default = "default_build_wait_ms")]
    pub build_wait_ms: u64,

    /// How often the janitor evicts stale memory entries (seconds)
    /// Default: every 10 minutes
    #[serde(default = "default_sweep_interval_secs")]
    pub sweep_interval_secs: u64,
}

fn default_ttl_secs() -> u64 {
    86_400
}

fn default_build_wait_ms() -> u64 {
    30_000
}

fn default_sweep_interval_secs() -> u64 {
    600
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl_secs: default_ttl_secs(),
            build_wait_ms: default_build_wait_ms(),
            sweep_interval_secs: default_sweep_interval_secs(),
        }
    }
}

impl CacheConfig {
    /// Short-lived entries and frequent sweeps, for a season in progress
    pub fn aggressive() -> Self {
        Self {
            ttl_secs: 6 * 3600,
            build_wait_ms: 10_000,
            sweep_interval_secs: 300,
        }
    }

    /// Long-lived entries, for completed seasons
    pub fn lenient() -> Self {
        Self {
            ttl_secs: 7 * 86_400,
            build_wait_ms: 60_000,
            sweep_interval_secs: 3600,
        }
    }

    /// Get the entry TTL as a Duration
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }

    /// Get the build wait bound as a Duration
    pub fn build_wait(&self) -> Duration {
        Duration::from_millis(self.build_wait_ms)
    }

    /// Get the sweep interval as a Duration
    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.sweep_interval_secs == 0 {
            return Err("sweep_interval_secs must be greater than 0".to_string());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_durations() {
        let config = CacheConfig::default();
        assert_eq!(config.ttl(), Duration::from_secs(86_400));
        assert_eq!(config.build_wait(), Duration::from_secs(30));
        assert_eq!(config.sweep_interval(), Duration::from_secs(600));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_zero_sweep_interval_rejected() {
        let config = CacheConfig {
            sweep_interval_secs: 0,
            ..CacheConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_presets_order() {
        assert!(CacheConfig::aggressive().ttl() < CacheConfig::default().ttl());
        assert!(CacheConfig::lenient().ttl() > CacheConfig::default().ttl());
    }
}
