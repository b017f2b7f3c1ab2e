//! Multi-season constructor history
//!
//! Combines the constructor summaries of already built seasons. Nothing here
//! talks to a provider; callers hand in the payloads they could obtain.

use crate::error::EngineError;
use paddock_domain::team::DEFAULT_TEAM_COLOR;
use paddock_domain::{BestResult, SeasonPayload};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// One constructor across several seasons
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConstructorHistory {
    /// Normalized team name
    pub name: String,
    /// First non-default livery color seen
    pub team_color: String,
    /// Points across all seasons
    pub total_points: f64,
    /// Wins across all seasons
    pub wins: u32,
    /// Podiums across all seasons
    pub podiums: u32,
    /// Poles across all seasons
    pub poles: u32,
    /// Seasons contested
    pub seasons: Vec<i32>,
    /// Every driver who raced for the team
    pub drivers: Vec<String>,
    /// Regular drivers per season
    pub drivers_by_year: BTreeMap<i32, Vec<String>>,
    /// Points per season
    pub points_by_year: BTreeMap<i32, f64>,
    /// Wins per season
    pub wins_by_year: BTreeMap<i32, u32>,
    /// Podiums per season
    pub podiums_by_year: BTreeMap<i32, u32>,
    /// Championship position per season
    pub standings_by_year: BTreeMap<i32, u32>,
    /// Highest-scoring race across all seasons
    pub best_result: Option<BestResult>,
    /// Country of origin, when known
    pub origin: Option<String>,
}

impl ConstructorHistory {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            team_color: DEFAULT_TEAM_COLOR.to_string(),
            total_points: 0.0,
            wins: 0,
            podiums: 0,
            poles: 0,
            seasons: Vec::new(),
            drivers: Vec::new(),
            drivers_by_year: BTreeMap::new(),
            points_by_year: BTreeMap::new(),
            wins_by_year: BTreeMap::new(),
            podiums_by_year: BTreeMap::new(),
            standings_by_year: BTreeMap::new(),
            best_result: None,
            origin: None,
        }
    }
}

/// Constructor history over a range of seasons
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryReport {
    /// Constructor name → history
    pub constructors: BTreeMap<String, ConstructorHistory>,
    /// Seasons that contributed, ascending
    pub years: Vec<i32>,
}

/// Two constructors side by side
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConstructorComparison {
    /// First constructor
    pub constructor1: ConstructorHistory,
    /// Second constructor
    pub constructor2: ConstructorHistory,
    /// Seasons covered
    pub years: Vec<i32>,
}

impl HistoryReport {
    /// Combine season payloads, in any order
    pub fn combine<'a>(seasons: impl IntoIterator<Item = &'a SeasonPayload>) -> Self {
        let mut payloads: Vec<&SeasonPayload> = seasons.into_iter().collect();
        payloads.sort_by_key(|p| p.season);

        let mut constructors: BTreeMap<String, ConstructorHistory> = BTreeMap::new();
        let mut drivers: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
        let mut years = Vec::new();

        for payload in payloads {
            if years.last() != Some(&payload.season) {
                years.push(payload.season);
            }

            for (name, summary) in &payload.constructors {
                let history = constructors
                    .entry(name.clone())
                    .or_insert_with(|| ConstructorHistory::new(name));
                let year = payload.season;

                history.total_points += summary.total_points;
                history.wins += summary.wins;
                history.podiums += summary.podiums;
                history.poles += summary.poles;
                if !history.seasons.contains(&year) {
                    history.seasons.push(year);
                }
                *history.points_by_year.entry(year).or_insert(0.0) += summary.total_points;
                *history.wins_by_year.entry(year).or_insert(0) += summary.wins;
                *history.podiums_by_year.entry(year).or_insert(0) += summary.podiums;
                if let Some(position) = summary.championship_position {
                    history.standings_by_year.insert(year, position);
                }
                history
                    .drivers_by_year
                    .insert(year, summary.regular_drivers.clone());

                if history.team_color == DEFAULT_TEAM_COLOR {
                    history.team_color = summary.team_color.clone();
                }
                if history.origin.is_none() {
                    history.origin = summary.origin.clone();
                }

                if let Some(candidate) = &summary.best_result {
                    let better = history
                        .best_result
                        .as_ref()
                        .map(|current| candidate.points > current.points)
                        .unwrap_or(true);
                    if better {
                        history.best_result = Some(candidate.clone());
                    }
                }

                drivers
                    .entry(name.clone())
                    .or_default()
                    .extend(summary.drivers.iter().cloned());
            }
        }

        for (name, set) in drivers {
            if let Some(history) = constructors.get_mut(&name) {
                history.drivers = set.into_iter().collect();
            }
        }

        Self {
            constructors,
            years,
        }
    }

    /// Look up one constructor
    pub fn get(&self, name: &str) -> Result<&ConstructorHistory, EngineError> {
        self.constructors
            .get(name)
            .ok_or_else(|| EngineError::UnknownConstructor(name.to_string()))
    }

    /// Compare two constructors
    pub fn compare(&self, first: &str, second: &str) -> Result<ConstructorComparison, EngineError> {
        Ok(ConstructorComparison {
            constructor1: self.get(first)?.clone(),
            constructor2: self.get(second)?.clone(),
            years: self.years.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use paddock_domain::{ConstructorSummary, SCHEMA_VERSION};

    fn summary(name: &str, points: f64, position: u32, best_points: f64, round: u32) -> ConstructorSummary {
        ConstructorSummary {
            name: name.to_string(),
            team_color: "#FF8000".to_string(),
            total_points: points,
            wins: 1,
            podiums: 2,
            poles: 1,
            drivers: vec!["Lando Norris".to_string(), "Oscar Piastri".to_string()],
            regular_drivers: vec!["Lando Norris".to_string()],
            championship_position: Some(position),
            best_result: Some(BestResult {
                season: 0,
                round,
                event: format!("Round {}", round),
                points: best_points,
                drivers: Vec::new(),
            }),
            origin: Some("United Kingdom".to_string()),
        }
    }

    fn season(year: i32, teams: Vec<ConstructorSummary>) -> SeasonPayload {
        let mut payload = SeasonPayload::empty(year, SCHEMA_VERSION);
        for team in teams {
            payload.constructors.insert(team.name.clone(), team);
        }
        payload
    }

    #[test]
    fn test_combine_sums_across_years() {
        let seasons = vec![
            season(2024, vec![summary("McLaren", 666.0, 1, 44.0, 18)]),
            season(2023, vec![summary("McLaren", 302.0, 4, 33.0, 11)]),
        ];
        let report = HistoryReport::combine(&seasons);

        assert_eq!(report.years, vec![2023, 2024]);
        let mclaren = report.get("McLaren").unwrap();
        assert_eq!(mclaren.total_points, 968.0);
        assert_eq!(mclaren.wins, 2);
        assert_eq!(mclaren.seasons, vec![2023, 2024]);
        assert_eq!(mclaren.standings_by_year[&2023], 4);
        assert_eq!(mclaren.points_by_year[&2024], 666.0);
        assert_eq!(mclaren.best_result.as_ref().unwrap().round, 18);
        assert_eq!(mclaren.drivers.len(), 2);
        assert_eq!(mclaren.team_color, "#FF8000");
    }

    #[test]
    fn test_compare_unknown() {
        let report = HistoryReport::combine(&[season(2022, vec![summary("Ferrari", 554.0, 2, 43.0, 1)])]);
        assert!(report.compare("Ferrari", "Ferrari").is_ok());
        assert_eq!(
            report.compare("Ferrari", "Brawn GP").unwrap_err(),
            EngineError::UnknownConstructor("Brawn GP".to_string())
        );
    }

    #[test]
    fn test_years_serialize_as_string_keys() {
        let report = HistoryReport::combine(&[season(2021, vec![summary("Alpine", 155.0, 5, 12.0, 3)])]);
        let value = serde_json::to_value(&report).unwrap();
        assert_eq!(value["constructors"]["Alpine"]["points_by_year"]["2021"], 155.0);
    }
}
