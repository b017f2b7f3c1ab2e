//! Season aggregation
//!
//! Walks the schedule of a season, reconciles every round and folds the
//! results into fresh driver and constructor accumulators.

use crate::config::EngineConfig;
use crate::error::EngineError;
use crate::reconciler::Reconciler;
use crate::types::Reconciled;
use paddock_domain::accumulator::assign_championship_positions;
use paddock_domain::result::total_points;
use paddock_domain::team::normalize_team_name;
use paddock_domain::{
    ConstructorSeasonEntry, DriverSeasonEntry, RaceSummary, RaceWinner, RoundDescriptor,
    RoundResult, SeasonPayload, SessionKind, SprintFormat,
};
use paddock_sources::{
    HistoricalResultsProvider, PrimaryResultsProvider, ScheduleProvider, SourceError,
};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Accumulators of one aggregation pass
#[derive(Debug, Default)]
struct SeasonFold {
    drivers: BTreeMap<String, DriverSeasonEntry>,
    constructors: BTreeMap<String, ConstructorSeasonEntry>,
    races: Vec<RaceSummary>,
    sprint_rounds: Vec<u32>,
}

impl SeasonFold {
    fn constructor_for(&mut self, row: &RoundResult) -> Option<&mut ConstructorSeasonEntry> {
        let team = row.team_name.as_deref().filter(|t| !t.trim().is_empty())?;
        Some(
            self.constructors
                .entry(normalize_team_name(team))
                .or_default(),
        )
    }

    fn fold_race(&mut self, round: &RoundDescriptor, reconciled: &Reconciled) {
        for row in &reconciled.rows {
            let driver = self.drivers.entry(row.driver_code.clone()).or_default();
            driver.record_race(row);
            if let Some(grid) = row.grid_position {
                driver.record_grid(grid);
            }

            if let Some(team) = self.constructor_for(row) {
                team.record_race(round.round, &round.event_name, row);
            }
        }

        self.races.push(RaceSummary {
            round: round.round,
            event_name: round.event_name.clone(),
            source: reconciled.source,
            winner: reconciled.winner().map(|w| RaceWinner {
                code: w.driver_code.clone(),
                driver: w.full_name.clone().unwrap_or_else(|| w.driver_code.clone()),
                team: w.team_name.as_deref().map(normalize_team_name),
            }),
        });
    }

    fn fold_pole(&mut self, round: u32, pole: &RoundResult) {
        self.drivers
            .entry(pole.driver_code.clone())
            .or_default()
            .record_pole(round);

        let team = self
            .drivers
            .get(&pole.driver_code)
            .and_then(|d| d.team.clone())
            .or_else(|| pole.team_name.clone());
        if let Some(team) = team {
            self.constructors
                .entry(normalize_team_name(&team))
                .or_default()
                .record_pole();
        }
    }

    fn fold_sprint(&mut self, round: u32, rows: &[RoundResult]) {
        let mut scored = 0.0;
        for row in rows {
            let points = row.points();
            if points <= 0.0 {
                continue;
            }
            scored += points;

            let driver = self.drivers.entry(row.driver_code.clone()).or_default();
            driver.add_sprint_points(points);
            driver.absorb_metadata(row);

            // sprint rows often lack a team; the driver's latest one stands in
            if let Some(team) = driver.team.clone().filter(|t| !t.trim().is_empty()) {
                self.constructors
                    .entry(normalize_team_name(&team))
                    .or_default()
                    .add_sprint_points(points);
            }
        }

        if scored > 0.0 {
            self.sprint_rounds.push(round);
        }
    }

    fn finalize(self, season: i32, schema_version: u32) -> SeasonPayload {
        let mut payload = SeasonPayload::empty(season, schema_version);
        payload.drivers = self
            .drivers
            .iter()
            .map(|(code, entry)| (code.clone(), entry.finalize(code)))
            .collect();
        payload.constructors = self
            .constructors
            .iter()
            .map(|(name, entry)| (name.clone(), entry.finalize(name, season)))
            .collect();
        assign_championship_positions(&mut payload.constructors);
        payload.sprint_rounds = self.sprint_rounds.into_iter().collect();
        payload.races = self.races;
        payload
    }
}

/// Rows scored with the sprint schedule when the source reported none
fn score_sprint(rows: Vec<RoundResult>, format: SprintFormat) -> Vec<RoundResult> {
    if total_points(&rows) > 0.0 {
        return rows;
    }
    rows.into_iter()
        .map(|mut row| {
            row.reported_points = Some(row.position.map(|p| format.points(p)).unwrap_or(0.0));
            row
        })
        .collect()
}

/// Copy qualifying positions onto the race rows as grid slots
fn apply_qualifying_grid(rows: &mut [RoundResult], qualifying: &[RoundResult]) {
    for row in rows.iter_mut() {
        if let Some(q) = qualifying.iter().find(|q| row.same_driver(q)) {
            row.grid_position = q.position;
        }
    }
}

fn first_place(rows: &[RoundResult]) -> Option<RoundResult> {
    rows.iter().find(|r| r.position == Some(1)).cloned()
}

/// Season aggregator
///
/// Stateless between calls: every build starts from empty accumulators, so
/// two builds over identical upstream data produce equal payloads.
#[derive(Clone)]
pub struct SeasonAggregator {
    reconciler: Reconciler,
    primary: Arc<dyn PrimaryResultsProvider>,
    secondary: Arc<dyn HistoricalResultsProvider>,
    schedule: Arc<dyn ScheduleProvider>,
    config: EngineConfig,
}

impl SeasonAggregator {
    /// Create an aggregator over the three providers
    pub fn new(
        primary: Arc<dyn PrimaryResultsProvider>,
        secondary: Arc<dyn HistoricalResultsProvider>,
        schedule: Arc<dyn ScheduleProvider>,
        config: EngineConfig,
    ) -> Self {
        Self {
            reconciler: Reconciler::new(Arc::clone(&primary), Arc::clone(&secondary)),
            primary,
            secondary,
            schedule,
            config,
        }
    }

    /// Engine configuration
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Schema version stamped on built payloads
    pub fn schema_version(&self) -> u32 {
        self.config.schema_version
    }

    /// Rounds of a season, testing events removed, in round order
    pub async fn rounds(&self, season: i32) -> Result<Vec<RoundDescriptor>, EngineError> {
        let mut rounds = self
            .schedule
            .fetch_season_schedule(season)
            .await
            .map_err(|source| EngineError::ScheduleUnavailable { season, source })?;
        rounds.retain(|r| r.round > 0);
        rounds.sort_by_key(|r| r.round);
        rounds.dedup_by_key(|r| r.round);
        Ok(rounds)
    }

    /// Build the statistics of one season
    ///
    /// # Errors
    ///
    /// - `ScheduleUnavailable` when the schedule cannot be fetched
    /// - `EmptySeason` when every round was skipped
    pub async fn build_season(&self, season: i32) -> Result<SeasonPayload, EngineError> {
        let rounds = self.rounds(season).await?;
        info!(season, rounds = rounds.len(), "building season");

        let sprint_format =
            SprintFormat::for_season(season, self.config.inaugural_sprint_last_season);
        let mut fold = SeasonFold::default();

        for round in &rounds {
            let (reconciled, sprint) = tokio::join!(
                self.reconciler.reconcile(season, round.round),
                self.sprint_results(season, round.round),
            );

            let mut reconciled = match reconciled {
                Ok(reconciled) => reconciled,
                Err(e) => {
                    warn!(season, round = round.round, error = %e, "skipping round");
                    continue;
                }
            };

            let pole = self.resolve_grid_and_pole(season, round.round, &mut reconciled).await;
            fold.fold_race(round, &reconciled);
            if let Some(pole) = pole {
                fold.fold_pole(round.round, &pole);
            }
            if let Some(rows) = sprint {
                fold.fold_sprint(round.round, &score_sprint(rows, sprint_format));
            }
        }

        if fold.drivers.is_empty() {
            return Err(EngineError::EmptySeason(season));
        }

        let payload = fold.finalize(season, self.config.schema_version);
        info!(
            season,
            drivers = payload.drivers.len(),
            constructors = payload.constructors.len(),
            sprints = payload.sprint_rounds.len(),
            "season built"
        );
        Ok(payload)
    }

    /// Fill missing grid slots from qualifying and pick the pole sitter
    async fn resolve_grid_and_pole(
        &self,
        season: i32,
        round: u32,
        reconciled: &mut Reconciled,
    ) -> Option<RoundResult> {
        let mut qualifying_pole = None;
        if !reconciled.has_grid() {
            if let Some(qualifying) = self.qualifying_results(season, round).await {
                apply_qualifying_grid(&mut reconciled.rows, &qualifying);
                qualifying_pole = first_place(&qualifying);
            }
        }

        let grid_pole = reconciled
            .rows
            .iter()
            .find(|r| r.grid_position == Some(1))
            .cloned();
        if let Some(pole) = grid_pole.or(qualifying_pole) {
            return Some(pole);
        }
        if reconciled.has_grid() {
            return None;
        }

        let shootout = self
            .primary
            .fetch_session_results(season, round, SessionKind::SprintShootout)
            .await;
        match shootout {
            Ok(rows) => first_place(&rows),
            Err(e) => {
                debug!(season, round, error = %e, "no pole source");
                None
            }
        }
    }

    async fn qualifying_results(&self, season: i32, round: u32) -> Option<Vec<RoundResult>> {
        let primary = self
            .primary
            .fetch_session_results(season, round, SessionKind::Qualifying)
            .await;
        match primary {
            Ok(rows) if !rows.is_empty() => return Some(rows),
            Ok(_) => {}
            Err(e) => debug!(season, round, error = %e, "primary qualifying unavailable"),
        }

        match self.secondary.fetch_qualifying_results(season, round).await {
            Ok(rows) if !rows.is_empty() => Some(rows),
            Ok(_) => None,
            Err(e) => {
                debug!(season, round, error = %e, "secondary qualifying unavailable");
                None
            }
        }
    }

    /// Sprint rows from the primary, then the secondary; `None` when the
    /// round held no sprint
    async fn sprint_results(&self, season: i32, round: u32) -> Option<Vec<RoundResult>> {
        let primary = self
            .primary
            .fetch_session_results(season, round, SessionKind::Sprint)
            .await;
        match primary {
            Ok(rows) if !rows.is_empty() => return Some(rows),
            Ok(_) => {}
            Err(e) => log_sprint_miss(season, round, "primary", &e),
        }

        match self.secondary.fetch_sprint_results(season, round).await {
            Ok(rows) if !rows.is_empty() => Some(rows),
            Ok(_) => None,
            Err(e) => {
                log_sprint_miss(season, round, "secondary", &e);
                None
            }
        }
    }
}

fn log_sprint_miss(season: i32, round: u32, source: &'static str, error: &SourceError) {
    match error {
        SourceError::NotFound(_) | SourceError::Unsupported(_) => {
            debug!(season, round, source, "no sprint");
        }
        _ => {
            warn!(season, round, source, error = %error, "sprint results unavailable");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use paddock_domain::Provenance;

    fn row(code: &str, pos: u32) -> RoundResult {
        RoundResult::new(code, Provenance::Primary).with_position(pos)
    }

    #[test]
    fn test_score_sprint_inaugural_schedule() {
        let rows = score_sprint(vec![row("LEC", 1), row("SAI", 3), row("NOR", 4)], SprintFormat::Inaugural);
        let points: Vec<f64> = rows.iter().map(RoundResult::points).collect();
        assert_eq!(points, vec![3.0, 1.0, 0.0]);
    }

    #[test]
    fn test_score_sprint_keeps_reported_points() {
        let rows = score_sprint(vec![row("VER", 1).with_points(8.0)], SprintFormat::Inaugural);
        assert_eq!(rows[0].points(), 8.0);
    }

    #[test]
    fn test_apply_qualifying_grid() {
        let mut rows = vec![row("VER", 2), row("HAM", 1)];
        apply_qualifying_grid(&mut rows, &[row("HAM", 2), row("VER", 1)]);
        assert_eq!(rows[0].grid_position, Some(1));
        assert_eq!(rows[1].grid_position, Some(2));
    }

    #[test]
    fn test_fold_sprint_records_round_only_with_points() {
        let mut fold = SeasonFold::default();
        fold.fold_sprint(4, &[row("LEC", 1)]);
        assert!(fold.sprint_rounds.is_empty());

        fold.fold_sprint(5, &[row("LEC", 1).with_points(3.0)]);
        assert_eq!(fold.sprint_rounds, vec![5]);
        assert_eq!(fold.drivers["LEC"].points, 3.0);
        assert_eq!(fold.drivers["LEC"].wins, 0);
    }
}
