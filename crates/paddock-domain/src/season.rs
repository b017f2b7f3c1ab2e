//! Season payload - the externally visible, schema-stamped artifact

use crate::result::SourceTag;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Current payload schema version
///
/// Bump whenever the computed shape or semantics of [`SeasonPayload`] change;
/// every cached payload stamped with another version is discarded.
pub const SCHEMA_VERSION: u32 = 6;

/// Finalized per-driver season statistics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DriverSummary {
    /// Display name
    pub name: String,

    /// Latest known team
    pub team: Option<String>,

    /// Latest known team color (`#RRGGBB`)
    pub team_color: Option<String>,

    /// Race plus sprint points
    pub total_points: f64,

    /// Grand prix wins
    pub wins: u32,

    /// Grand prix podiums
    pub podiums: u32,

    /// Retirements
    pub dnfs: u32,

    /// Mean classified finishing position, `None` with no classified finish
    pub avg_finish: Option<f64>,

    /// Pole positions
    pub poles: u32,

    /// Rounds in which the driver started from pole
    pub pole_rounds: Vec<u32>,

    /// Latest known grid slot
    pub grid_position: Option<u32>,
}

/// One driver's contribution to a constructor's best race
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BestResultDriver {
    /// Driver display name
    pub name: String,
    /// Points scored in that race
    pub points: f64,
    /// Finishing position
    pub position: Option<u32>,
}

/// A constructor's highest-scoring race
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BestResult {
    /// Season of the race
    pub season: i32,
    /// Round of the race
    pub round: u32,
    /// Event name
    pub event: String,
    /// Team points in that race
    pub points: f64,
    /// Scoring drivers, highest first
    pub drivers: Vec<BestResultDriver>,
}

/// Finalized per-constructor season statistics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConstructorSummary {
    /// Normalized team name
    pub name: String,

    /// Livery color (`#RRGGBB`)
    pub team_color: String,

    /// Race plus sprint points
    pub total_points: f64,

    /// Grand prix wins by any team driver
    pub wins: u32,

    /// Grand prix podiums by any team driver
    pub podiums: u32,

    /// Pole positions by any team driver
    pub poles: u32,

    /// Every driver who raced for the team, sorted
    pub drivers: Vec<String>,

    /// Drivers with at least three starts for the team, sorted
    pub regular_drivers: Vec<String>,

    /// Championship position by points within the season
    pub championship_position: Option<u32>,

    /// Highest-scoring race
    pub best_result: Option<BestResult>,

    /// Country of origin, when known
    pub origin: Option<String>,
}

/// Winner of one race
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RaceWinner {
    /// Driver code
    pub code: String,
    /// Driver display name
    pub driver: String,
    /// Team name
    pub team: Option<String>,
}

/// Per-round record of what was aggregated
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RaceSummary {
    /// Round number
    pub round: u32,
    /// Event name
    pub event_name: String,
    /// Reconciliation branch that produced the round's results
    pub source: SourceTag,
    /// Race winner, if any row was classified first
    pub winner: Option<RaceWinner>,
}

/// Season statistics as served to clients and persisted on disk
///
/// Built once per (season, schema version) and never patched afterwards.
/// Maps are ordered so that two builds over identical data serialize
/// identically.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeasonPayload {
    /// Schema version the payload was built under
    pub schema_version: u32,

    /// Season year
    pub season: i32,

    /// Driver code → summary
    pub drivers: BTreeMap<String, DriverSummary>,

    /// Rounds that held a points-scoring sprint
    pub sprint_rounds: BTreeSet<u32>,

    /// Constructor name → summary
    #[serde(default)]
    pub constructors: BTreeMap<String, ConstructorSummary>,

    /// Processed rounds in round order
    #[serde(default)]
    pub races: Vec<RaceSummary>,
}

impl SeasonPayload {
    /// Create an empty payload for a season
    pub fn empty(season: i32, schema_version: u32) -> Self {
        Self {
            schema_version,
            season,
            drivers: BTreeMap::new(),
            sprint_rounds: BTreeSet::new(),
            constructors: BTreeMap::new(),
            races: Vec::new(),
        }
    }

    /// Whether no driver was aggregated
    pub fn is_empty(&self) -> bool {
        self.drivers.is_empty()
    }
}

/// A payload together with the time it was built, as written to disk
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredSeason {
    /// Build time, seconds since Unix epoch
    pub built_at: u64,

    /// The payload itself, flattened into the same JSON object
    #[serde(flatten)]
    pub payload: SeasonPayload,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stored_season_layout_is_flat() {
        let mut payload = SeasonPayload::empty(2023, SCHEMA_VERSION);
        payload.sprint_rounds.insert(4);
        let stored = StoredSeason { built_at: 1_700_000_000, payload };

        let value = serde_json::to_value(&stored).unwrap();
        assert_eq!(value["schema_version"], SCHEMA_VERSION);
        assert_eq!(value["season"], 2023);
        assert_eq!(value["sprint_rounds"], serde_json::json!([4]));
        assert_eq!(value["built_at"], 1_700_000_000u64);
        assert!(value["drivers"].is_object());
    }

    #[test]
    fn test_payload_without_supplements_deserializes() {
        let json = r#"{"schema_version": 6, "season": 2021, "drivers": {}, "sprint_rounds": [10, 14]}"#;
        let payload: SeasonPayload = serde_json::from_str(json).unwrap();
        assert!(payload.constructors.is_empty());
        assert!(payload.races.is_empty());
        assert_eq!(payload.sprint_rounds.len(), 2);
    }
}
