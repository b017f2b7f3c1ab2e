//! Session kinds, schedule entries and lap records

use serde::{Deserialize, Serialize};

/// Kind of on-track session within a round
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionKind {
    /// Grand prix
    Race,
    /// Qualifying for the grand prix
    Qualifying,
    /// Sprint race
    Sprint,
    /// Qualifying for the sprint
    SprintShootout,
}

impl SessionKind {
    /// Get the session name as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionKind::Race => "race",
            SessionKind::Qualifying => "qualifying",
            SessionKind::Sprint => "sprint",
            SessionKind::SprintShootout => "sprint_shootout",
        }
    }

    /// Parse a session kind from a string
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "race" | "r" => Some(SessionKind::Race),
            "qualifying" | "q" => Some(SessionKind::Qualifying),
            "sprint" | "s" => Some(SessionKind::Sprint),
            "sprint_shootout" | "sprint shootout" | "sprint qualifying" | "sq" => {
                Some(SessionKind::SprintShootout)
            }
            _ => None,
        }
    }
}

impl std::str::FromStr for SessionKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| format!("Invalid session kind: {}", s))
    }
}

/// One scheduled round of a season
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoundDescriptor {
    /// Round number; 0 is reserved for testing events
    pub round: u32,

    /// Event name (e.g. "Bahrain Grand Prix")
    pub event_name: String,

    /// Host country
    #[serde(default)]
    pub country: Option<String>,

    /// Race date (ISO-8601)
    #[serde(default)]
    pub date: Option<String>,
}

impl RoundDescriptor {
    /// Create a descriptor with only round and name
    pub fn new(round: u32, event_name: impl Into<String>) -> Self {
        Self {
            round,
            event_name: event_name.into(),
            country: None,
            date: None,
        }
    }
}

/// One timed lap of one driver
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LapRecord {
    /// Driver code
    pub driver_code: String,

    /// Car number
    pub driver_number: Option<u32>,

    /// Lap number (1-based)
    pub lap_number: u32,

    /// Running race position at the end of this lap
    pub position: Option<u32>,
}
