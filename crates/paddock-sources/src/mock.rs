//! Deterministic in-memory providers for tests and offline development
//!
//! Every mock answers from a table populated up front and counts the calls it
//! receives. A key with no entry answers `NotFound`.

use crate::{
    HistoricalResultsProvider, PrimaryResultsProvider, ScheduleProvider, SourceError,
};
use async_trait::async_trait;
use paddock_domain::{LapRecord, RoundDescriptor, RoundResult, SessionKind};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

type Answer<T> = Result<Vec<T>, SourceError>;

fn not_found(season: i32, round: u32, what: &str) -> SourceError {
    SourceError::NotFound(format!("{} {} round {}", season, what, round))
}

/// Mock primary provider
///
/// # Examples
///
/// ```
/// use paddock_domain::SessionKind;
/// use paddock_sources::{MockPrimary, SourceError};
///
/// let provider = MockPrimary::new();
/// provider.add_error(2023, 2, SessionKind::Race, SourceError::Communication("down".into()));
/// assert_eq!(provider.call_count(), 0);
/// ```
#[derive(Debug, Clone, Default)]
pub struct MockPrimary {
    sessions: Arc<Mutex<HashMap<(i32, u32, SessionKind), Answer<RoundResult>>>>,
    laps: Arc<Mutex<HashMap<(i32, u32), Answer<LapRecord>>>>,
    call_count: Arc<AtomicUsize>,
}

impl MockPrimary {
    /// Create an empty mock
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer a session with these rows
    pub fn add_results(&self, season: i32, round: u32, kind: SessionKind, rows: Vec<RoundResult>) {
        self.sessions.lock().insert((season, round, kind), Ok(rows));
    }

    /// Answer a session with an error
    pub fn add_error(&self, season: i32, round: u32, kind: SessionKind, error: SourceError) {
        self.sessions.lock().insert((season, round, kind), Err(error));
    }

    /// Answer the lap query of a race with these laps
    pub fn add_laps(&self, season: i32, round: u32, laps: Vec<LapRecord>) {
        self.laps.lock().insert((season, round), Ok(laps));
    }

    /// Number of calls received across all methods
    pub fn call_count(&self) -> usize {
        self.call_count.load(Ordering::SeqCst)
    }

    /// Reset the call count
    pub fn reset_call_count(&self) {
        self.call_count.store(0, Ordering::SeqCst);
    }
}

#[async_trait]
impl PrimaryResultsProvider for MockPrimary {
    async fn fetch_session_results(
        &self,
        season: i32,
        round: u32,
        kind: SessionKind,
    ) -> Result<Vec<RoundResult>, SourceError> {
        self.call_count.fetch_add(1, Ordering::SeqCst);
        self.sessions
            .lock()
            .get(&(season, round, kind))
            .cloned()
            .unwrap_or_else(|| Err(not_found(season, round, kind.as_str())))
    }

    async fn fetch_race_laps(
        &self,
        season: i32,
        round: u32,
    ) -> Result<Vec<LapRecord>, SourceError> {
        self.call_count.fetch_add(1, Ordering::SeqCst);
        self.laps
            .lock()
            .get(&(season, round))
            .cloned()
            .unwrap_or_else(|| Err(not_found(season, round, "laps")))
    }
}

/// Mock historical provider
///
/// Sprint results fall back to `Unsupported` unless explicitly configured,
/// matching providers that never carried sprints.
#[derive(Debug, Clone, Default)]
pub struct MockHistorical {
    races: Arc<Mutex<HashMap<(i32, u32), Answer<RoundResult>>>>,
    qualifying: Arc<Mutex<HashMap<(i32, u32), Answer<RoundResult>>>>,
    sprints: Arc<Mutex<HashMap<(i32, u32), Answer<RoundResult>>>>,
    call_count: Arc<AtomicUsize>,
}

impl MockHistorical {
    /// Create an empty mock
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer a race with these rows
    pub fn add_race(&self, season: i32, round: u32, rows: Vec<RoundResult>) {
        self.races.lock().insert((season, round), Ok(rows));
    }

    /// Answer a race with an error
    pub fn add_race_error(&self, season: i32, round: u32, error: SourceError) {
        self.races.lock().insert((season, round), Err(error));
    }

    /// Answer a qualifying session with these rows
    pub fn add_qualifying(&self, season: i32, round: u32, rows: Vec<RoundResult>) {
        self.qualifying.lock().insert((season, round), Ok(rows));
    }

    /// Answer a sprint with these rows
    pub fn add_sprint(&self, season: i32, round: u32, rows: Vec<RoundResult>) {
        self.sprints.lock().insert((season, round), Ok(rows));
    }

    /// Number of calls received across all methods
    pub fn call_count(&self) -> usize {
        self.call_count.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl HistoricalResultsProvider for MockHistorical {
    async fn fetch_race_results(
        &self,
        season: i32,
        round: u32,
    ) -> Result<Vec<RoundResult>, SourceError> {
        self.call_count.fetch_add(1, Ordering::SeqCst);
        self.races
            .lock()
            .get(&(season, round))
            .cloned()
            .unwrap_or_else(|| Err(not_found(season, round, "race")))
    }

    async fn fetch_qualifying_results(
        &self,
        season: i32,
        round: u32,
    ) -> Result<Vec<RoundResult>, SourceError> {
        self.call_count.fetch_add(1, Ordering::SeqCst);
        self.qualifying
            .lock()
            .get(&(season, round))
            .cloned()
            .unwrap_or_else(|| Err(not_found(season, round, "qualifying")))
    }

    async fn fetch_sprint_results(
        &self,
        season: i32,
        round: u32,
    ) -> Result<Vec<RoundResult>, SourceError> {
        self.call_count.fetch_add(1, Ordering::SeqCst);
        self.sprints
            .lock()
            .get(&(season, round))
            .cloned()
            .unwrap_or(Err(SourceError::Unsupported("sprint results")))
    }
}

/// Mock schedule provider
#[derive(Debug, Clone, Default)]
pub struct MockSchedule {
    seasons: Arc<Mutex<HashMap<i32, Answer<RoundDescriptor>>>>,
    call_count: Arc<AtomicUsize>,
}

impl MockSchedule {
    /// Create an empty mock
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer a season with these rounds
    pub fn add_season(&self, season: i32, rounds: Vec<RoundDescriptor>) {
        self.seasons.lock().insert(season, Ok(rounds));
    }

    /// Answer a season with an error
    pub fn add_error(&self, season: i32, error: SourceError) {
        self.seasons.lock().insert(season, Err(error));
    }

    /// Number of schedule lookups received
    pub fn call_count(&self) -> usize {
        self.call_count.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ScheduleProvider for MockSchedule {
    async fn fetch_season_schedule(
        &self,
        season: i32,
    ) -> Result<Vec<RoundDescriptor>, SourceError> {
        self.call_count.fetch_add(1, Ordering::SeqCst);
        self.seasons
            .lock()
            .get(&season)
            .cloned()
            .unwrap_or_else(|| Err(SourceError::NotFound(format!("{} schedule", season))))
    }
}
