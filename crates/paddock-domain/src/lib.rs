//! Paddock Domain Layer
//!
//! This crate contains the data model and the pure business rules shared by
//! every other Paddock crate. Its only external dependency is `serde`, because
//! the season payload is persisted and served as JSON verbatim.
//!
//! ## Key Concepts
//!
//! - **RoundResult**: One classified competitor in one round, already mapped
//!   from whatever shape the upstream source used
//! - **FinishStatus**: Finished / retired (DNF) / disqualified / did not start
//! - **Points schedules**: The classic top-10 race schedule and both sprint formats
//! - **Accumulators**: Per-driver and per-constructor folds over one season
//! - **SeasonPayload**: The immutable, schema-stamped artifact served to clients
//!
//! ## Architecture
//!
//! - No I/O and no async
//! - Infrastructure (sources, store, cache) lives in other crates
//! - Trait definitions for the persisted tier live in [`traits`]

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod accumulator;
pub mod points;
pub mod result;
pub mod season;
pub mod session;
pub mod team;
pub mod traits;

// Re-exports for convenience
pub use accumulator::{ConstructorSeasonEntry, DriverSeasonEntry};
pub use points::{race_points, SprintFormat, INAUGURAL_SPRINT_LAST_SEASON};
pub use result::{FinishStatus, Provenance, RoundResult, SourceTag};
pub use season::{
    BestResult, BestResultDriver, ConstructorSummary, DriverSummary, RaceSummary, RaceWinner,
    SeasonPayload, StoredSeason, SCHEMA_VERSION,
};
pub use session::{LapRecord, RoundDescriptor, SessionKind};
