//! Data types for reconciliation output

use paddock_domain::{result::total_points, RoundResult, SourceTag};

/// Authoritative result set of one round
#[derive(Debug, Clone, PartialEq)]
pub struct Reconciled {
    /// Precedence branch that produced the rows
    pub source: SourceTag,

    /// Classified rows, enriched from the other source
    pub rows: Vec<RoundResult>,
}

impl Reconciled {
    /// Total points across all rows
    pub fn total_points(&self) -> f64 {
        total_points(&self.rows)
    }

    /// Row classified first, if any
    pub fn winner(&self) -> Option<&RoundResult> {
        self.rows.iter().find(|r| r.position == Some(1))
    }

    /// Whether any row carries a grid slot
    pub fn has_grid(&self) -> bool {
        self.rows.iter().any(|r| r.grid_position.is_some())
    }
}
