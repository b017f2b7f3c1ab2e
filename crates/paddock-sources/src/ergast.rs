//! Ergast-compatible historical provider
//!
//! Works against the Jolpica mirror of the Ergast API. Every numeric field
//! arrives as a string; team colours are never provided. Requests are paced
//! to the mirror's published burst limit.

use crate::config::SourcesConfig;
use crate::http::HttpFetcher;
use crate::{HistoricalResultsProvider, ScheduleProvider, SourceError};
use async_trait::async_trait;
use paddock_domain::{FinishStatus, Provenance, RoundDescriptor, RoundResult};
use serde::Deserialize;
use tracing::debug;

#[derive(Debug, Deserialize)]
struct Envelope {
    #[serde(rename = "MRData")]
    mr_data: MrData,
}

#[derive(Debug, Deserialize)]
struct MrData {
    #[serde(rename = "RaceTable")]
    race_table: RaceTable,
}

#[derive(Debug, Deserialize)]
struct RaceTable {
    #[serde(rename = "Races", default)]
    races: Vec<Race>,
}

#[derive(Debug, Deserialize)]
struct Race {
    round: String,
    #[serde(rename = "raceName", default)]
    race_name: String,
    #[serde(default)]
    date: Option<String>,
    #[serde(rename = "Circuit", default)]
    circuit: Option<Circuit>,
    #[serde(rename = "Results", default)]
    results: Vec<ResultRow>,
    #[serde(rename = "SprintResults", default)]
    sprint_results: Vec<ResultRow>,
    #[serde(rename = "QualifyingResults", default)]
    qualifying_results: Vec<ResultRow>,
}

#[derive(Debug, Deserialize)]
struct Circuit {
    #[serde(rename = "Location", default)]
    location: Option<Location>,
}

#[derive(Debug, Deserialize)]
struct Location {
    #[serde(default)]
    country: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ResultRow {
    #[serde(default)]
    number: Option<String>,
    #[serde(default)]
    position: Option<String>,
    #[serde(default)]
    points: Option<String>,
    #[serde(default)]
    grid: Option<String>,
    #[serde(default)]
    status: Option<String>,
    #[serde(rename = "Driver")]
    driver: DriverRef,
    #[serde(rename = "Constructor", default)]
    constructor: Option<ConstructorRef>,
}

#[derive(Debug, Deserialize)]
struct DriverRef {
    #[serde(default)]
    code: Option<String>,
    #[serde(rename = "givenName", default)]
    given_name: String,
    #[serde(rename = "familyName", default)]
    family_name: String,
}

#[derive(Debug, Deserialize)]
struct ConstructorRef {
    name: String,
}

fn parse_u32(raw: &Option<String>) -> Option<u32> {
    raw.as_deref().and_then(|s| s.trim().parse().ok())
}

impl DriverRef {
    /// Three-letter code, synthesized from the family name for drivers
    /// that predate official codes
    fn code(&self) -> Option<String> {
        if let Some(code) = self.code.as_deref().filter(|c| !c.trim().is_empty()) {
            return Some(code.to_string());
        }
        let letters: String = self
            .family_name
            .chars()
            .filter(|c| c.is_alphabetic())
            .take(3)
            .collect();
        (!letters.is_empty()).then_some(letters)
    }

    fn full_name(&self) -> Option<String> {
        let name = format!("{} {}", self.given_name, self.family_name);
        let name = name.trim();
        (!name.is_empty()).then(|| name.to_string())
    }
}

impl ResultRow {
    fn into_round_result(self) -> Option<RoundResult> {
        let mut row = RoundResult::new(self.driver.code()?, Provenance::Secondary);
        row.driver_number = parse_u32(&self.number);
        row.position = parse_u32(&self.position);
        row.grid_position = parse_u32(&self.grid).filter(|g| *g > 0);
        row.reported_points = self
            .points
            .as_deref()
            .and_then(|p| p.trim().parse::<f64>().ok());
        row.status = self.status.as_deref().and_then(FinishStatus::classify);
        row.full_name = self.driver.full_name();
        row.team_name = self.constructor.map(|c| c.name);
        Some(row)
    }
}

/// Ergast/Jolpica HTTP client
pub struct ErgastClient {
    base_url: String,
    http: HttpFetcher,
}

impl ErgastClient {
    /// Create a client from the shared sources configuration
    pub fn new(config: &SourcesConfig) -> Result<Self, SourceError> {
        Ok(Self {
            base_url: config.secondary_base_url.trim_end_matches('/').to_string(),
            http: HttpFetcher::new(config)?
                .with_rate_limit(config.secondary_requests_per_second),
        })
    }

    async fn races(&self, path: &str) -> Result<Vec<Race>, SourceError> {
        let url = format!("{}/{}.json?limit=100", self.base_url, path);
        let envelope: Envelope = self.http.get_json(&url).await?;
        Ok(envelope.mr_data.race_table.races)
    }

    async fn single_race(&self, season: i32, round: u32, path: &str) -> Result<Race, SourceError> {
        self.races(&format!("{}/{}/{}", season, round, path))
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| SourceError::NotFound(format!("{} {} round {}", season, path, round)))
    }
}

fn rows(rows: Vec<ResultRow>) -> Vec<RoundResult> {
    rows.into_iter()
        .filter_map(ResultRow::into_round_result)
        .collect()
}

#[async_trait]
impl HistoricalResultsProvider for ErgastClient {
    async fn fetch_race_results(
        &self,
        season: i32,
        round: u32,
    ) -> Result<Vec<RoundResult>, SourceError> {
        let race = self.single_race(season, round, "results").await?;
        debug!(season, round, rows = race.results.len(), "secondary race results");
        Ok(rows(race.results))
    }

    async fn fetch_qualifying_results(
        &self,
        season: i32,
        round: u32,
    ) -> Result<Vec<RoundResult>, SourceError> {
        let race = self.single_race(season, round, "qualifying").await?;
        Ok(rows(race.qualifying_results))
    }

    async fn fetch_sprint_results(
        &self,
        season: i32,
        round: u32,
    ) -> Result<Vec<RoundResult>, SourceError> {
        let race = self.single_race(season, round, "sprint").await?;
        Ok(rows(race.sprint_results))
    }
}

#[async_trait]
impl ScheduleProvider for ErgastClient {
    async fn fetch_season_schedule(
        &self,
        season: i32,
    ) -> Result<Vec<RoundDescriptor>, SourceError> {
        let races = self.races(&season.to_string()).await?;
        Ok(schedule_from(races))
    }
}

fn schedule_from(races: Vec<Race>) -> Vec<RoundDescriptor> {
    let mut rounds: Vec<RoundDescriptor> = races
        .into_iter()
        .filter_map(|race| {
            let round = race.round.trim().parse().ok()?;
            let mut descriptor = RoundDescriptor::new(round, race.race_name);
            descriptor.date = race.date;
            descriptor.country = race
                .circuit
                .and_then(|c| c.location)
                .and_then(|l| l.country);
            Some(descriptor)
        })
        .collect();
    rounds.sort_by_key(|r| r.round);
    rounds
}
