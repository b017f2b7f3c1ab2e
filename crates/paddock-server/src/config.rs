//! Configuration file parsing for the server.
//!
//! Loads the bind address, the season cache directory, and the nested
//! component sections from TOML, then applies environment overrides.

use paddock_cache::CacheConfig;
use paddock_engine::EngineConfig;
use paddock_sources::SourcesConfig;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Overrides the persisted season directory
pub const ENV_SEASON_CACHE_DIR: &str = "PADDOCK_SEASON_CACHE_DIR";
/// Overrides the primary provider base URL
pub const ENV_PRIMARY_BASE_URL: &str = "PADDOCK_PRIMARY_BASE_URL";
/// Overrides the secondary provider base URL
pub const ENV_SECONDARY_BASE_URL: &str = "PADDOCK_SECONDARY_BASE_URL";

/// Server configuration error
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read config file
    #[error("Failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    /// Failed to parse TOML
    #[error("Failed to parse config TOML: {0}")]
    TomlParse(#[from] toml::de::Error),

    /// Missing required field
    #[error("Missing required configuration field: {0}")]
    MissingField(String),

    /// A section failed validation
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Server configuration loaded from TOML
///
/// Every field has a default, so an empty file is a valid configuration.
///
/// ```toml
/// bind_address = "0.0.0.0"
/// bind_port = 8000
/// season_cache_dir = "/var/lib/paddock/seasons"
///
/// [sources]
/// response_cache_dir = "/var/cache/paddock/http"
///
/// [engine]
/// history_last_season = 2025
///
/// [cache]
/// ttl_secs = 86400
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Bind address (e.g., "127.0.0.1")
    #[serde(default = "default_bind_address")]
    pub bind_address: String,

    /// Bind port
    #[serde(default = "default_bind_port")]
    pub bind_port: u16,

    /// Directory holding one persisted file per season
    #[serde(default = "default_season_cache_dir")]
    pub season_cache_dir: PathBuf,

    /// Upstream provider settings
    #[serde(default)]
    pub sources: SourcesConfig,

    /// Aggregation settings
    #[serde(default)]
    pub engine: EngineConfig,

    /// Cache tier settings
    #[serde(default)]
    pub cache: CacheConfig,
}

fn default_bind_address() -> String {
    "127.0.0.1".to_string()
}

fn default_bind_port() -> u16 {
    8000
}

fn default_season_cache_dir() -> PathBuf {
    PathBuf::from("season_cache")
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            bind_port: default_bind_port(),
            season_cache_dir: default_season_cache_dir(),
            sources: SourcesConfig::default(),
            engine: EngineConfig::default(),
            cache: CacheConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Load configuration from a TOML file, then apply environment overrides
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        let mut config: ServerConfig = toml::from_str(&contents)?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Create a default configuration for testing
    pub fn default_test_config() -> Self {
        ServerConfig {
            bind_port: 8080,
            season_cache_dir: std::env::temp_dir().join("paddock-season-cache"),
            ..ServerConfig::default()
        }
    }

    /// Apply `PADDOCK_*` environment variables
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Apply overrides from any key lookup
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let lookup = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        if let Some(dir) = lookup(ENV_SEASON_CACHE_DIR) {
            self.season_cache_dir = PathBuf::from(dir);
        }
        if let Some(url) = lookup(ENV_PRIMARY_BASE_URL) {
            self.sources.primary_base_url = url;
        }
        if let Some(url) = lookup(ENV_SECONDARY_BASE_URL) {
            self.sources.secondary_base_url = url;
        }
    }

    /// Check required fields and every nested section
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.bind_address.trim().is_empty() {
            return Err(ConfigError::MissingField("bind_address".to_string()));
        }
        if self.sources.primary_base_url.trim().is_empty() {
            return Err(ConfigError::MissingField("sources.primary_base_url".to_string()));
        }
        if self.sources.secondary_base_url.trim().is_empty() {
            return Err(ConfigError::MissingField("sources.secondary_base_url".to_string()));
        }
        self.engine.validate().map_err(ConfigError::Invalid)?;
        self.cache.validate().map_err(ConfigError::Invalid)?;
        Ok(())
    }

    /// Get the full bind address (address:port)
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.bind_address, self.bind_port)
    }
}
