//! Configuration for the engine

use paddock_domain::{INAUGURAL_SPRINT_LAST_SEASON, SCHEMA_VERSION};
use serde::{Deserialize, Serialize};
use std::ops::RangeInclusive;

/// Configuration for reconciliation and season aggregation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Schema version stamped on every built payload
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,

    /// Last season scored with the three-place sprint schedule
    #[serde(default = "default_inaugural_sprint_last_season")]
    pub inaugural_sprint_last_season: i32,

    /// First season included in constructor history
    #[serde(default = "default_history_first_season")]
    pub history_first_season: i32,

    /// Last season included in constructor history
    #[serde(default = "default_history_last_season")]
    pub history_last_season: i32,
}

fn default_schema_version() -> u32 {
    SCHEMA_VERSION
}

fn default_inaugural_sprint_last_season() -> i32 {
    INAUGURAL_SPRINT_LAST_SEASON
}

fn default_history_first_season() -> i32 {
    2018
}

fn default_history_last_season() -> i32 {
    2025
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            schema_version: default_schema_version(),
            inaugural_sprint_last_season: default_inaugural_sprint_last_season(),
            history_first_season: default_history_first_season(),
            history_last_season: default_history_last_season(),
        }
    }
}

impl EngineConfig {
    /// Seasons covered by constructor history
    pub fn history_seasons(&self) -> RangeInclusive<i32> {
        self.history_first_season..=self.history_last_season
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.schema_version == 0 {
            return Err("schema_version must be greater than 0".to_string());
        }
        if self.history_first_season > self.history_last_season {
            return Err("history_first_season cannot exceed history_last_season".to_string());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = EngineConfig::default();
        assert_eq!(config.schema_version, SCHEMA_VERSION);
        assert_eq!(config.inaugural_sprint_last_season, 2021);
        assert_eq!(config.history_seasons(), 2018..=2025);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_invalid_history_range() {
        let config = EngineConfig {
            history_first_season: 2024,
            history_last_season: 2020,
            ..EngineConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
