//! Season accumulators
//!
//! Each accumulator is owned by exactly one aggregation pass. It only ever
//! grows while rounds are folded in, and is turned into an immutable summary
//! once the pass is complete.

use crate::result::RoundResult;
use crate::season::{BestResult, BestResultDriver, ConstructorSummary, DriverSummary};
use crate::team::{display_color, team_origin, DEFAULT_TEAM_COLOR};
use std::collections::BTreeMap;

/// Starts needed before a driver counts as a team's regular driver
pub const REGULAR_DRIVER_MIN_STARTS: u32 = 3;

/// Per-driver season accumulator
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DriverSeasonEntry {
    /// Race plus sprint points
    pub points: f64,
    /// Wins
    pub wins: u32,
    /// Podiums
    pub podiums: u32,
    /// Retirements
    pub dnfs: u32,
    /// Poles
    pub poles: u32,
    /// Rounds started from pole
    pub pole_rounds: Vec<u32>,
    /// Classified finishing positions in round order
    pub positions: Vec<u32>,
    /// Latest known grid slot
    pub grid_position: Option<u32>,
    /// Latest known team
    pub team: Option<String>,
    /// Latest known normalized team color
    pub team_color: Option<String>,
    /// Latest known display name
    pub full_name: Option<String>,
}

impl DriverSeasonEntry {
    /// Create an empty accumulator
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one reconciled grand prix row
    pub fn record_race(&mut self, row: &RoundResult) {
        self.points += row.points();

        if let Some(pos) = row.position.filter(|p| *p > 0) {
            self.positions.push(pos);
            if pos == 1 {
                self.wins += 1;
            }
            if pos <= 3 {
                self.podiums += 1;
            }
        }

        if row.is_dnf() {
            self.dnfs += 1;
        }

        self.absorb_metadata(row);
    }

    /// Keep the latest present team, color and name
    pub fn absorb_metadata(&mut self, row: &RoundResult) {
        if let Some(team) = &row.team_name {
            self.team = Some(team.clone());
        }
        if let Some(color) = &row.team_color {
            self.team_color = Some(color.clone());
        }
        if let Some(name) = &row.full_name {
            self.full_name = Some(name.clone());
        }
    }

    /// Record the grid slot for the latest round
    pub fn record_grid(&mut self, grid: u32) {
        self.grid_position = Some(grid);
    }

    /// Record a pole in a round
    pub fn record_pole(&mut self, round: u32) {
        self.poles += 1;
        self.pole_rounds.push(round);
    }

    /// Add sprint points; sprints never touch win/podium/DNF/grid
    pub fn add_sprint_points(&mut self, points: f64) {
        self.points += points;
    }

    /// Mean classified finishing position
    pub fn average_finish(&self) -> Option<f64> {
        if self.positions.is_empty() {
            return None;
        }
        let sum: u64 = self.positions.iter().map(|p| u64::from(*p)).sum();
        Some(sum as f64 / self.positions.len() as f64)
    }

    /// Produce the immutable summary
    pub fn finalize(&self, code: &str) -> DriverSummary {
        DriverSummary {
            name: self.full_name.clone().unwrap_or_else(|| code.to_string()),
            team: self.team.clone(),
            team_color: self.team_color.as_deref().map(display_color),
            total_points: self.points,
            wins: self.wins,
            podiums: self.podiums,
            dnfs: self.dnfs,
            avg_finish: self.average_finish(),
            poles: self.poles,
            pole_rounds: self.pole_rounds.clone(),
            grid_position: self.grid_position,
        }
    }
}

/// Team points in one round, with the contributing drivers
#[derive(Debug, Clone, Default, PartialEq)]
struct RoundTally {
    event: String,
    points: f64,
    drivers: Vec<BestResultDriver>,
}

/// Per-constructor season accumulator
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConstructorSeasonEntry {
    /// Race plus sprint points
    pub points: f64,
    /// Wins
    pub wins: u32,
    /// Podiums
    pub podiums: u32,
    /// Poles
    pub poles: u32,
    /// First non-empty normalized color seen
    pub team_color: Option<String>,
    /// Driver name → starts for this team
    pub starts: BTreeMap<String, u32>,
    rounds: BTreeMap<u32, RoundTally>,
}

impl ConstructorSeasonEntry {
    /// Create an empty accumulator
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one reconciled grand prix row driven for this team
    pub fn record_race(&mut self, round: u32, event: &str, row: &RoundResult) {
        let points = row.points();
        self.points += points;

        if self.team_color.is_none() {
            self.team_color = row.team_color.clone();
        }

        let name = row
            .full_name
            .clone()
            .unwrap_or_else(|| row.driver_code.clone());
        *self.starts.entry(name.clone()).or_insert(0) += 1;

        if let Some(pos) = row.position.filter(|p| *p > 0) {
            if pos == 1 {
                self.wins += 1;
            }
            if pos <= 3 {
                self.podiums += 1;
            }
        }

        let tally = self.rounds.entry(round).or_insert_with(|| RoundTally {
            event: event.to_string(),
            ..RoundTally::default()
        });
        tally.points += points;
        if points > 0.0 {
            tally.drivers.push(BestResultDriver {
                name,
                points,
                position: row.position,
            });
        }
    }

    /// Record a pole by one of the team's drivers
    pub fn record_pole(&mut self) {
        self.poles += 1;
    }

    /// Add sprint points to the season total
    pub fn add_sprint_points(&mut self, points: f64) {
        self.points += points;
    }

    /// Highest-scoring round, earliest round wins ties
    pub fn best_result(&self, season: i32) -> Option<BestResult> {
        let mut best: Option<(u32, &RoundTally)> = None;
        for (round, tally) in &self.rounds {
            if tally.points <= 0.0 {
                continue;
            }
            match best {
                Some((_, current)) if current.points >= tally.points => {}
                _ => best = Some((*round, tally)),
            }
        }

        best.map(|(round, tally)| {
            let mut drivers = tally.drivers.clone();
            drivers.sort_by(|a, b| b.points.total_cmp(&a.points).then(a.name.cmp(&b.name)));
            BestResult {
                season,
                round,
                event: tally.event.clone(),
                points: tally.points,
                drivers,
            }
        })
    }

    /// Produce the immutable summary; championship position is assigned later
    pub fn finalize(&self, name: &str, season: i32) -> ConstructorSummary {
        let drivers: Vec<String> = self.starts.keys().cloned().collect();
        let regular_drivers = self
            .starts
            .iter()
            .filter(|(_, starts)| **starts >= REGULAR_DRIVER_MIN_STARTS)
            .map(|(driver, _)| driver.clone())
            .collect();

        ConstructorSummary {
            name: name.to_string(),
            team_color: self
                .team_color
                .as_deref()
                .map(display_color)
                .unwrap_or_else(|| DEFAULT_TEAM_COLOR.to_string()),
            total_points: self.points,
            wins: self.wins,
            podiums: self.podiums,
            poles: self.poles,
            drivers,
            regular_drivers,
            championship_position: None,
            best_result: self.best_result(season),
            origin: team_origin(name).map(str::to_string),
        }
    }
}

/// Assign championship positions by points, name breaking ties
pub fn assign_championship_positions(constructors: &mut BTreeMap<String, ConstructorSummary>) {
    let mut order: Vec<(String, f64)> = constructors
        .iter()
        .map(|(name, summary)| (name.clone(), summary.total_points))
        .collect();
    order.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)));

    for (index, (name, _)) in order.into_iter().enumerate() {
        if let Some(summary) = constructors.get_mut(&name) {
            summary.championship_position = Some(index as u32 + 1);
        }
    }
}
