//! Result reconciliation
//!
//! Combines the primary provider, the historical provider and the lap-derived
//! fallback into one result set per round:
//!
//! 1. primary, when it reports positive total points
//! 2. secondary, when it reports positive total points
//! 3. primary positions with points filled in from the secondary, whenever
//!    the secondary answered at all
//! 4. a provisional classification derived from laps, or from the primary's
//!    finishing order when no laps are available
//!
//! Whatever branch wins, rows are cross-filled with metadata from the other
//! source.

use crate::error::EngineError;
use crate::fallback::{derive_from_laps, derive_from_positions};
use crate::types::Reconciled;
use paddock_domain::result::{has_positions, total_points};
use paddock_domain::{RoundResult, SessionKind, SourceTag};
use paddock_sources::{HistoricalResultsProvider, PrimaryResultsProvider, SourceError};
use std::sync::Arc;
use tracing::{debug, warn};

/// Outcome of the precedence decision over two completed fetches
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    /// One of the first three branches applied
    Resolved(Reconciled),

    /// Only lap derivation is left; both fetches are handed back for seeding
    /// and enrichment
    Derive {
        /// Primary rows, if any
        primary: Option<Vec<RoundResult>>,
        /// Secondary rows, if any
        secondary: Option<Vec<RoundResult>>,
    },
}

/// Fill absent metadata of every row from its counterpart in `other`
pub fn enrich(rows: &mut [RoundResult], other: &[RoundResult]) {
    for row in rows.iter_mut() {
        if let Some(source) = other.iter().find(|o| row.same_driver(o)) {
            row.enrich_from(source);
        }
    }
}

/// Primary rows with absent points filled from the secondary
pub fn merge_points(primary: &[RoundResult], secondary: &[RoundResult]) -> Vec<RoundResult> {
    primary
        .iter()
        .map(|row| {
            let mut row = row.clone();
            if row.reported_points.is_none() {
                row.reported_points = secondary
                    .iter()
                    .find(|s| row.same_driver(s))
                    .and_then(|s| s.reported_points);
            }
            row
        })
        .collect()
}

/// Apply the precedence policy to two completed fetches
///
/// Pure: the decision depends only on its inputs.
pub fn resolve(
    primary: Option<Vec<RoundResult>>,
    secondary: Option<Vec<RoundResult>>,
) -> Resolution {
    let empty: &[RoundResult] = &[];

    if let Some(rows) = primary.as_ref().filter(|r| total_points(r) > 0.0) {
        let mut rows = rows.clone();
        enrich(&mut rows, secondary.as_deref().unwrap_or(empty));
        return Resolution::Resolved(Reconciled {
            source: SourceTag::Primary,
            rows,
        });
    }

    if let Some(rows) = secondary.as_ref().filter(|r| total_points(r) > 0.0) {
        let mut rows = rows.clone();
        enrich(&mut rows, primary.as_deref().unwrap_or(empty));
        return Resolution::Resolved(Reconciled {
            source: SourceTag::Secondary,
            rows,
        });
    }

    if let (Some(a), Some(b)) = (primary.as_ref(), secondary.as_ref()) {
        if has_positions(a) {
            let mut rows = merge_points(a, b);
            enrich(&mut rows, b);
            return Resolution::Resolved(Reconciled {
                source: SourceTag::PrimaryWithSecondaryPoints,
                rows,
            });
        }
    }

    Resolution::Derive { primary, secondary }
}

/// Per-round reconciler over the two results providers
#[derive(Clone)]
pub struct Reconciler {
    primary: Arc<dyn PrimaryResultsProvider>,
    secondary: Arc<dyn HistoricalResultsProvider>,
}

impl Reconciler {
    /// Create a reconciler
    pub fn new(
        primary: Arc<dyn PrimaryResultsProvider>,
        secondary: Arc<dyn HistoricalResultsProvider>,
    ) -> Self {
        Self { primary, secondary }
    }

    /// Reconcile one round
    ///
    /// Both providers are queried concurrently; the decision is made once
    /// both have answered. Provider failures are logged and recovered.
    pub async fn reconcile(&self, season: i32, round: u32) -> Result<Reconciled, EngineError> {
        let (primary, secondary) = tokio::join!(
            self.primary
                .fetch_session_results(season, round, SessionKind::Race),
            self.secondary.fetch_race_results(season, round),
        );
        let primary = usable(primary, "primary", season, round);
        let secondary = usable(secondary, "secondary", season, round);

        let (primary, secondary) = match resolve(primary, secondary) {
            Resolution::Resolved(reconciled) => {
                debug!(season, round, source = %reconciled.source, rows = reconciled.rows.len(), "round reconciled");
                return Ok(reconciled);
            }
            Resolution::Derive { primary, secondary } => (primary, secondary),
        };

        let laps = match self.primary.fetch_race_laps(season, round).await {
            Ok(laps) => laps,
            Err(e) => {
                debug!(season, round, error = %e, "no lap data");
                Vec::new()
            }
        };

        let derived = derive_from_laps(&laps)
            .or_else(|| primary.as_deref().and_then(derive_from_positions));

        match derived {
            Some(mut rows) => {
                if let Some(b) = &secondary {
                    enrich(&mut rows, b);
                }
                if let Some(a) = &primary {
                    enrich(&mut rows, a);
                }
                debug!(season, round, rows = rows.len(), "round derived");
                Ok(Reconciled {
                    source: SourceTag::Derived,
                    rows,
                })
            }
            None => Err(EngineError::NoResultsAvailable { season, round }),
        }
    }
}

/// Non-empty rows from a fetch, failures logged
fn usable(
    result: Result<Vec<RoundResult>, SourceError>,
    source: &'static str,
    season: i32,
    round: u32,
) -> Option<Vec<RoundResult>> {
    match result {
        Ok(rows) if rows.is_empty() => None,
        Ok(rows) => Some(rows),
        Err(e) if e.is_not_found() => {
            debug!(season, round, source, error = %e, "source has no data");
            None
        }
        Err(e) => {
            warn!(season, round, source, error = %e, "source unavailable");
            None
        }
    }
}
