//! Lap-derived provisional classification
//!
//! Used when neither provider reports points. Drivers are ordered by their
//! last known running position, then by laps completed, and scored with the
//! classic top-10 race schedule.

use paddock_domain::{race_points, LapRecord, Provenance, RoundResult};
use std::cmp::Ordering;
use std::collections::BTreeMap;

#[derive(Debug, Default)]
struct LastLap {
    number: Option<u32>,
    laps: u32,
    position: Option<u32>,
    position_lap: u32,
}

/// Order of two candidates: known position first, lower position first,
/// more laps first
fn provisional_order(a: (Option<u32>, u32), b: (Option<u32>, u32)) -> Ordering {
    let by_position = match (a.0, b.0) {
        (Some(x), Some(y)) => x.cmp(&y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    };
    by_position.then(b.1.cmp(&a.1))
}

fn score(order: Vec<(String, Option<u32>)>) -> Vec<RoundResult> {
    order
        .into_iter()
        .enumerate()
        .map(|(index, (code, number))| {
            let position = index as u32 + 1;
            let mut row = RoundResult::new(code, Provenance::LapDerived)
                .with_position(position)
                .with_points(race_points(position));
            row.driver_number = number;
            row
        })
        .collect()
}

/// Provisional classification from raw laps
///
/// Returns `None` when there are no usable laps.
pub fn derive_from_laps(laps: &[LapRecord]) -> Option<Vec<RoundResult>> {
    let mut drivers: BTreeMap<String, LastLap> = BTreeMap::new();
    for lap in laps {
        let code = lap.driver_code.trim().to_uppercase();
        if code.is_empty() {
            continue;
        }
        let entry = drivers.entry(code).or_default();
        entry.laps = entry.laps.max(lap.lap_number);
        if entry.number.is_none() {
            entry.number = lap.driver_number;
        }
        if let Some(position) = lap.position {
            if entry.position.is_none() || lap.lap_number >= entry.position_lap {
                entry.position = Some(position);
                entry.position_lap = lap.lap_number;
            }
        }
    }

    if drivers.is_empty() {
        return None;
    }

    let mut order: Vec<(String, LastLap)> = drivers.into_iter().collect();
    order.sort_by(|(_, a), (_, b)| provisional_order((a.position, a.laps), (b.position, b.laps)));

    Some(score(
        order
            .into_iter()
            .map(|(code, last)| (code, last.number))
            .collect(),
    ))
}

/// Provisional classification seeded from another source's finishing order
///
/// Returns `None` when no row carries a finishing position.
pub fn derive_from_positions(rows: &[RoundResult]) -> Option<Vec<RoundResult>> {
    let mut classified: Vec<&RoundResult> = rows
        .iter()
        .filter(|r| r.position.is_some() && !r.driver_code.is_empty())
        .collect();
    if classified.is_empty() {
        return None;
    }

    classified.sort_by(|a, b| {
        a.position
            .cmp(&b.position)
            .then_with(|| a.driver_code.cmp(&b.driver_code))
    });

    Some(score(
        classified
            .into_iter()
            .map(|r| (r.driver_code.clone(), r.driver_number))
            .collect(),
    ))
}
