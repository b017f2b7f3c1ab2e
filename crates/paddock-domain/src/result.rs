//! Round results - one row per classified competitor in one round

use crate::team::normalize_team_color;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Which adapter produced a row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Provenance {
    /// Structured per-session results source
    Primary,
    /// Historical results web API
    Secondary,
    /// Provisional classification rebuilt from lap timing
    LapDerived,
}

/// Which branch of the reconciliation precedence produced a round's result set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SourceTag {
    /// Primary source carried positive points
    #[serde(rename = "primary")]
    Primary,
    /// Secondary source carried positive points
    #[serde(rename = "secondary")]
    Secondary,
    /// Primary positions with points filled from the secondary source
    #[serde(rename = "primary+secondary-points")]
    PrimaryWithSecondaryPoints,
    /// Provisional classification with the classic points schedule
    #[serde(rename = "derived")]
    Derived,
}

impl SourceTag {
    /// Get the tag as it appears in payloads and logs
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceTag::Primary => "primary",
            SourceTag::Secondary => "secondary",
            SourceTag::PrimaryWithSecondaryPoints => "primary+secondary-points",
            SourceTag::Derived => "derived",
        }
    }
}

impl fmt::Display for SourceTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classified outcome of one competitor's race
///
/// Disqualification and exclusion are deliberately *not* counted as DNFs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FinishStatus {
    /// Took the flag, including lapped finishers
    Finished,
    /// Retired or not classified
    Retired,
    /// Disqualified or excluded
    Disqualified,
    /// Did not start
    DidNotStart,
}

impl FinishStatus {
    /// Classify a free-text upstream status
    ///
    /// Returns `None` for blank text so that enrichment can fill it from
    /// another source.
    ///
    /// # Examples
    ///
    /// ```
    /// use paddock_domain::FinishStatus;
    ///
    /// assert_eq!(FinishStatus::classify("+1 Lap"), Some(FinishStatus::Finished));
    /// assert_eq!(FinishStatus::classify("Engine"), Some(FinishStatus::Retired));
    /// assert_eq!(FinishStatus::classify("Disqualified"), Some(FinishStatus::Disqualified));
    /// assert_eq!(FinishStatus::classify("  "), None);
    /// ```
    pub fn classify(text: &str) -> Option<Self> {
        let status = text.trim().to_lowercase();
        if status.is_empty() {
            return None;
        }
        if status.starts_with('+') || status == "finished" || status == "lapped" {
            return Some(FinishStatus::Finished);
        }
        match status.as_str() {
            "disqualified" | "excluded" => Some(FinishStatus::Disqualified),
            "did not start" | "withdrew" => Some(FinishStatus::DidNotStart),
            // "Not classified" and every mechanical/accident reason land here
            _ => Some(FinishStatus::Retired),
        }
    }

    /// Whether this outcome counts towards a driver's DNF total
    pub fn is_dnf(&self) -> bool {
        matches!(self, FinishStatus::Retired)
    }
}

/// One classified competitor in one round
///
/// Adapters are responsible for mapping their upstream shapes into this
/// struct. A row is only retained when `driver_code` is non-empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoundResult {
    /// Three-letter driver code (e.g. "VER")
    pub driver_code: String,

    /// Permanent car number, used as a join key when codes disagree
    pub driver_number: Option<u32>,

    /// Full display name
    pub full_name: Option<String>,

    /// Team name as reported upstream
    pub team_name: Option<String>,

    /// Normalized `RRGGBB` team color
    pub team_color: Option<String>,

    /// Finishing position (1-based)
    pub position: Option<u32>,

    /// Starting grid slot (1-based)
    pub grid_position: Option<u32>,

    /// Points as reported upstream; `None` when the source had no value
    pub reported_points: Option<f64>,

    /// Classified outcome
    pub status: Option<FinishStatus>,

    /// Adapter that produced the row
    pub provenance: Provenance,
}

impl RoundResult {
    /// Create a row with only a driver code and provenance set
    pub fn new(driver_code: impl Into<String>, provenance: Provenance) -> Self {
        let driver_code: String = driver_code.into();
        Self {
            driver_code: driver_code.trim().to_uppercase(),
            driver_number: None,
            full_name: None,
            team_name: None,
            team_color: None,
            position: None,
            grid_position: None,
            reported_points: None,
            status: None,
            provenance,
        }
    }

    /// Set the finishing position
    pub fn with_position(mut self, position: u32) -> Self {
        self.position = Some(position);
        self
    }

    /// Set the reported points
    pub fn with_points(mut self, points: f64) -> Self {
        self.reported_points = Some(points);
        self
    }

    /// Set the grid slot
    pub fn with_grid(mut self, grid: u32) -> Self {
        self.grid_position = Some(grid);
        self
    }

    /// Set the team name and (normalized) color
    pub fn with_team(mut self, name: impl Into<String>, color: Option<&str>) -> Self {
        self.team_name = Some(name.into());
        self.team_color = color.and_then(normalize_team_color);
        self
    }

    /// Set the car number
    pub fn with_number(mut self, number: u32) -> Self {
        self.driver_number = Some(number);
        self
    }

    /// Set the full name
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.full_name = Some(name.into());
        self
    }

    /// Set the finish status
    pub fn with_status(mut self, status: FinishStatus) -> Self {
        self.status = Some(status);
        self
    }

    /// Points with the absent-means-zero rule applied
    pub fn points(&self) -> f64 {
        match self.reported_points {
            Some(p) if p.is_finite() && p > 0.0 => p,
            _ => 0.0,
        }
    }

    /// Whether this row classifies as a DNF
    pub fn is_dnf(&self) -> bool {
        self.status.map(|s| s.is_dnf()).unwrap_or(false)
    }

    /// Whether two rows refer to the same driver
    ///
    /// Matches on driver code, falling back to car number.
    pub fn same_driver(&self, other: &RoundResult) -> bool {
        if !self.driver_code.is_empty() && self.driver_code == other.driver_code {
            return true;
        }
        matches!((self.driver_number, other.driver_number), (Some(a), Some(b)) if a == b)
    }

    /// Fill absent metadata from another row, never overwriting present values
    pub fn enrich_from(&mut self, other: &RoundResult) {
        fill(&mut self.team_name, &other.team_name);
        fill(&mut self.team_color, &other.team_color);
        fill(&mut self.full_name, &other.full_name);
        fill(&mut self.grid_position, &other.grid_position);
        fill(&mut self.status, &other.status);
        fill(&mut self.driver_number, &other.driver_number);
    }
}

fn fill<T: Clone>(target: &mut Option<T>, source: &Option<T>) {
    if target.is_none() {
        if let Some(value) = source {
            *target = Some(value.clone());
        }
    }
}

/// Sum of points over a result set, absent values counted as zero
pub fn total_points(rows: &[RoundResult]) -> f64 {
    rows.iter().map(RoundResult::points).sum()
}

/// Whether any row carries a finishing position
pub fn has_positions(rows: &[RoundResult]) -> bool {
    rows.iter().any(|r| r.position.is_some())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_finished_variants() {
        assert_eq!(FinishStatus::classify("Finished"), Some(FinishStatus::Finished));
        assert_eq!(FinishStatus::classify("+2 Laps"), Some(FinishStatus::Finished));
        assert_eq!(FinishStatus::classify("Lapped"), Some(FinishStatus::Finished));
    }

    #[test]
    fn test_classify_non_dnf_outcomes() {
        assert_eq!(FinishStatus::classify("Excluded"), Some(FinishStatus::Disqualified));
        assert_eq!(FinishStatus::classify("Did not start"), Some(FinishStatus::DidNotStart));
        assert!(!FinishStatus::Disqualified.is_dnf());
        assert!(!FinishStatus::DidNotStart.is_dnf());
    }

    #[test]
    fn test_not_classified_is_dnf() {
        let status = FinishStatus::classify("Not classified").unwrap();
        assert!(status.is_dnf());
    }

    #[test]
    fn test_points_default_to_zero() {
        let row = RoundResult::new("ver", Provenance::Primary);
        assert_eq!(row.driver_code, "VER");
        assert_eq!(row.points(), 0.0);

        let row = row.with_points(f64::NAN);
        assert_eq!(row.points(), 0.0);
    }

    #[test]
    fn test_enrich_never_overwrites() {
        let mut base = RoundResult::new("HAM", Provenance::Primary).with_team("Mercedes", None);
        let other = RoundResult::new("HAM", Provenance::Secondary)
            .with_team("Ferrari", Some("#E8002D"))
            .with_grid(4);

        base.enrich_from(&other);
        assert_eq!(base.team_name.as_deref(), Some("Mercedes"));
        assert_eq!(base.team_color.as_deref(), Some("E8002D"));
        assert_eq!(base.grid_position, Some(4));
    }

    #[test]
    fn test_same_driver_by_number() {
        let a = RoundResult::new("", Provenance::Primary).with_number(44);
        let b = RoundResult::new("HAM", Provenance::Secondary).with_number(44);
        assert!(a.same_driver(&b));
    }

    #[test]
    fn test_source_tag_serialization() {
        let json = serde_json::to_string(&SourceTag::PrimaryWithSecondaryPoints).unwrap();
        assert_eq!(json, "\"primary+secondary-points\"");
    }
}
