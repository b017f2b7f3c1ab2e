//! OpenF1 primary provider
//!
//! Session-level results with driver acronyms, numbers, names and team
//! colours. Rounds are resolved by ordering a season's meetings by start date
//! with testing events removed.
//!
//! # Examples
//!
//! ```no_run
//! use paddock_sources::{OpenF1Client, SourcesConfig};
//!
//! let client = OpenF1Client::new(&SourcesConfig::default()).unwrap();
//! ```

use crate::config::SourcesConfig;
use crate::http::HttpFetcher;
use crate::{PrimaryResultsProvider, SourceError};
use async_trait::async_trait;
use paddock_domain::{FinishStatus, LapRecord, Provenance, RoundResult, SessionKind};
use serde::Deserialize;
use std::collections::HashMap;
use tracing::{debug, warn};

#[derive(Debug, Deserialize)]
struct Meeting {
    meeting_key: u64,
    #[serde(default)]
    meeting_name: String,
    #[serde(default)]
    date_start: String,
}

#[derive(Debug, Deserialize)]
struct Session {
    session_key: u64,
    #[serde(default)]
    session_name: String,
}

#[derive(Debug, Deserialize)]
struct SessionResult {
    driver_number: u32,
    #[serde(default)]
    position: Option<u32>,
    #[serde(default)]
    points: Option<f64>,
    #[serde(default)]
    dnf: bool,
    #[serde(default)]
    dns: bool,
    #[serde(default)]
    dsq: bool,
}

#[derive(Debug, Deserialize)]
struct Driver {
    driver_number: u32,
    #[serde(default)]
    name_acronym: Option<String>,
    #[serde(default)]
    full_name: Option<String>,
    #[serde(default)]
    team_name: Option<String>,
    #[serde(default)]
    team_colour: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GridSlot {
    driver_number: u32,
    #[serde(default)]
    position: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct Lap {
    driver_number: u32,
    #[serde(default)]
    lap_number: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct PositionSample {
    driver_number: u32,
    position: u32,
    #[serde(default)]
    date: String,
}

/// OpenF1 HTTP client
pub struct OpenF1Client {
    base_url: String,
    http: HttpFetcher,
}

impl OpenF1Client {
    /// Create a client from the shared sources configuration
    pub fn new(config: &SourcesConfig) -> Result<Self, SourceError> {
        Ok(Self {
            base_url: config.primary_base_url.trim_end_matches('/').to_string(),
            http: HttpFetcher::new(config)?,
        })
    }

    async fn meeting_key(&self, season: i32, round: u32) -> Result<u64, SourceError> {
        let url = format!("{}/meetings?year={}", self.base_url, season);
        let meetings: Vec<Meeting> = self.http.get_json(&url).await?;

        ordered_meetings(meetings)
            .get((round as usize).wrapping_sub(1))
            .copied()
            .ok_or_else(|| SourceError::NotFound(format!("{} round {}", season, round)))
    }

    async fn session_key(
        &self,
        meeting_key: u64,
        kind: SessionKind,
    ) -> Result<u64, SourceError> {
        let url = format!("{}/sessions?meeting_key={}", self.base_url, meeting_key);
        let sessions: Vec<Session> = self.http.get_json(&url).await?;

        sessions
            .into_iter()
            .find(|s| SessionKind::parse(&s.session_name) == Some(kind))
            .map(|s| s.session_key)
            .ok_or_else(|| {
                SourceError::NotFound(format!("{} in meeting {}", kind.as_str(), meeting_key))
            })
    }

    async fn drivers(&self, session_key: u64) -> Result<HashMap<u32, Driver>, SourceError> {
        let url = format!("{}/drivers?session_key={}", self.base_url, session_key);
        let drivers: Vec<Driver> = self.http.get_json(&url).await?;
        Ok(drivers.into_iter().map(|d| (d.driver_number, d)).collect())
    }

    async fn starting_grid(&self, meeting_key: u64) -> HashMap<u32, u32> {
        let url = format!("{}/starting_grid?meeting_key={}", self.base_url, meeting_key);
        match self.http.get_json::<Vec<GridSlot>>(&url).await {
            Ok(slots) => slots
                .into_iter()
                .filter_map(|s| s.position.map(|p| (s.driver_number, p)))
                .collect(),
            Err(e) => {
                debug!(meeting_key, error = %e, "no starting grid");
                HashMap::new()
            }
        }
    }
}

/// Meeting keys in round order
fn ordered_meetings(mut meetings: Vec<Meeting>) -> Vec<u64> {
    meetings.retain(|m| !m.meeting_name.to_lowercase().contains("testing"));
    meetings.sort_by(|a, b| a.date_start.cmp(&b.date_start));
    meetings.into_iter().map(|m| m.meeting_key).collect()
}

fn status_of(result: &SessionResult) -> Option<FinishStatus> {
    if result.dsq {
        Some(FinishStatus::Disqualified)
    } else if result.dns {
        Some(FinishStatus::DidNotStart)
    } else if result.dnf {
        Some(FinishStatus::Retired)
    } else if result.position.is_some() {
        Some(FinishStatus::Finished)
    } else {
        None
    }
}

fn to_round_result(
    result: &SessionResult,
    driver: Option<&Driver>,
    grid: Option<u32>,
) -> Option<RoundResult> {
    let driver = driver?;
    let code = driver.name_acronym.as_deref().filter(|c| !c.trim().is_empty())?;

    let mut row = RoundResult::new(code, Provenance::Primary).with_number(result.driver_number);
    row.position = result.position;
    row.reported_points = result.points;
    row.grid_position = grid;
    row.status = status_of(result);
    row.full_name = driver.full_name.clone();
    if let Some(team) = &driver.team_name {
        row = row.with_team(team.clone(), driver.team_colour.as_deref());
    }
    Some(row)
}

#[async_trait]
impl PrimaryResultsProvider for OpenF1Client {
    async fn fetch_session_results(
        &self,
        season: i32,
        round: u32,
        kind: SessionKind,
    ) -> Result<Vec<RoundResult>, SourceError> {
        let meeting_key = self.meeting_key(season, round).await?;
        let session_key = self.session_key(meeting_key, kind).await?;

        let url = format!("{}/session_result?session_key={}", self.base_url, session_key);
        let results: Vec<SessionResult> = self.http.get_json(&url).await?;
        let drivers = self.drivers(session_key).await?;
        let grid = if kind == SessionKind::Race {
            self.starting_grid(meeting_key).await
        } else {
            HashMap::new()
        };

        let rows: Vec<RoundResult> = results
            .iter()
            .filter_map(|r| {
                let row = to_round_result(
                    r,
                    drivers.get(&r.driver_number),
                    grid.get(&r.driver_number).copied(),
                );
                if row.is_none() {
                    warn!(season, round, driver_number = r.driver_number, "dropping row without driver code");
                }
                row
            })
            .collect();

        debug!(season, round, session = kind.as_str(), rows = rows.len(), "primary results");
        Ok(rows)
    }

    async fn fetch_race_laps(
        &self,
        season: i32,
        round: u32,
    ) -> Result<Vec<LapRecord>, SourceError> {
        let meeting_key = self.meeting_key(season, round).await?;
        let session_key = self.session_key(meeting_key, SessionKind::Race).await?;
        let drivers = self.drivers(session_key).await?;

        let url = format!("{}/laps?session_key={}", self.base_url, session_key);
        let laps: Vec<Lap> = self.http.get_json(&url).await?;

        let url = format!("{}/position?session_key={}", self.base_url, session_key);
        let samples: Vec<PositionSample> = self.http.get_json(&url).await?;

        Ok(assemble_laps(&drivers, laps, samples))
    }
}

/// Join laps with the last position sample of each driver
///
/// The running position is only known at the end of the race, so it is
/// attached to each driver's final lap.
fn assemble_laps(
    drivers: &HashMap<u32, Driver>,
    laps: Vec<Lap>,
    samples: Vec<PositionSample>,
) -> Vec<LapRecord> {
    let mut final_position: HashMap<u32, (String, u32)> = HashMap::new();
    for sample in samples {
        let newer = final_position
            .get(&sample.driver_number)
            .map(|(date, _)| sample.date >= *date)
            .unwrap_or(true);
        if newer {
            final_position.insert(sample.driver_number, (sample.date, sample.position));
        }
    }

    let mut last_lap: HashMap<u32, u32> = HashMap::new();
    for lap in &laps {
        if let Some(n) = lap.lap_number {
            let entry = last_lap.entry(lap.driver_number).or_insert(n);
            *entry = (*entry).max(n);
        }
    }

    laps.into_iter()
        .filter_map(|lap| {
            let lap_number = lap.lap_number?;
            let code = drivers
                .get(&lap.driver_number)
                .and_then(|d| d.name_acronym.clone())?;
            let position = if last_lap.get(&lap.driver_number) == Some(&lap_number) {
                final_position.get(&lap.driver_number).map(|(_, p)| *p)
            } else {
                None
            };
            Some(LapRecord {
                driver_code: code.trim().to_uppercase(),
                driver_number: Some(lap.driver_number),
                lap_number,
                position,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn driver(number: u32, code: &str) -> Driver {
        Driver {
            driver_number: number,
            name_acronym: Some(code.to_string()),
            full_name: Some(format!("Driver {}", code)),
            team_name: Some("McLaren".to_string()),
            team_colour: Some("FF8000".to_string()),
        }
    }

    #[test]
    fn test_ordered_meetings_skips_testing() {
        let meetings: Vec<Meeting> = serde_json::from_str(
            r#"[
                {"meeting_key": 3, "meeting_name": "Saudi Arabian Grand Prix", "date_start": "2024-03-07T13:30:00+00:00"},
                {"meeting_key": 1, "meeting_name": "Pre-Season Testing", "date_start": "2024-02-21T07:00:00+00:00"},
                {"meeting_key": 2, "meeting_name": "Bahrain Grand Prix", "date_start": "2024-02-29T11:30:00+00:00"}
            ]"#,
        )
        .unwrap();
        assert_eq!(ordered_meetings(meetings), vec![2, 3]);
    }

    #[test]
    fn test_session_result_mapping() {
        let results: Vec<SessionResult> = serde_json::from_str(
            r#"[
                {"driver_number": 4, "position": 1, "points": 25, "dnf": false, "dns": false, "dsq": false},
                {"driver_number": 81, "position": null, "points": 0, "dnf": true, "dns": false, "dsq": false},
                {"driver_number": 99, "position": 5, "points": 10}
            ]"#,
        )
        .unwrap();
        let drivers: HashMap<u32, Driver> =
            [(4, driver(4, "NOR")), (81, driver(81, "PIA"))].into_iter().collect();

        let winner = to_round_result(&results[0], drivers.get(&4), Some(2)).unwrap();
        assert_eq!(winner.driver_code, "NOR");
        assert_eq!(winner.position, Some(1));
        assert_eq!(winner.grid_position, Some(2));
        assert_eq!(winner.status, Some(FinishStatus::Finished));
        assert_eq!(winner.team_color.as_deref(), Some("FF8000"));
        assert_eq!(winner.provenance, Provenance::Primary);

        let retired = to_round_result(&results[1], drivers.get(&81), None).unwrap();
        assert_eq!(retired.status, Some(FinishStatus::Retired));
        assert!(retired.is_dnf());

        assert!(to_round_result(&results[2], drivers.get(&99), None).is_none());
    }

    #[test]
    fn test_assemble_laps_marks_final_lap() {
        let drivers: HashMap<u32, Driver> =
            [(4, driver(4, "NOR")), (81, driver(81, "PIA"))].into_iter().collect();
        let laps = vec![
            Lap { driver_number: 4, lap_number: Some(1) },
            Lap { driver_number: 4, lap_number: Some(2) },
            Lap { driver_number: 81, lap_number: Some(1) },
            Lap { driver_number: 81, lap_number: None },
        ];
        let samples = vec![
            PositionSample { driver_number: 4, position: 2, date: "2024-03-02T15:03:00".into() },
            PositionSample { driver_number: 4, position: 1, date: "2024-03-02T16:30:00".into() },
            PositionSample { driver_number: 81, position: 2, date: "2024-03-02T15:10:00".into() },
        ];

        let records = assemble_laps(&drivers, laps, samples);
        assert_eq!(records.len(), 3);

        let nor_final = records
            .iter()
            .find(|r| r.driver_code == "NOR" && r.lap_number == 2)
            .unwrap();
        assert_eq!(nor_final.position, Some(1));
        let nor_first = records
            .iter()
            .find(|r| r.driver_code == "NOR" && r.lap_number == 1)
            .unwrap();
        assert_eq!(nor_first.position, None);
        let pia = records.iter().find(|r| r.driver_code == "PIA").unwrap();
        assert_eq!(pia.position, Some(2));
    }
}
