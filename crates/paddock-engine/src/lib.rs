//! Paddock Engine
//!
//! Turns raw per-round provider output into season statistics.
//!
//! # Overview
//!
//! Every upstream source is incomplete in its own way: the session-level
//! provider may carry no points for a round, the historical provider carries
//! no team colours, and some rounds only have lap timing. The engine resolves
//! one authoritative result set per round and folds a whole season into a
//! [`SeasonPayload`](paddock_domain::SeasonPayload).
//!
//! # Architecture
//!
//! ```text
//! Schedule → SeasonAggregator → Reconciler → { primary, secondary, laps }
//!                   ↓
//!             SeasonPayload → HistoryReport (many seasons)
//! ```
//!
//! # Example Usage
//!
//! ```no_run
//! use std::sync::Arc;
//! use paddock_engine::{EngineConfig, SeasonAggregator};
//! use paddock_sources::{ErgastClient, OpenF1Client, SourcesConfig};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let sources = SourcesConfig::default();
//! let ergast = Arc::new(ErgastClient::new(&sources)?);
//! let aggregator = SeasonAggregator::new(
//!     Arc::new(OpenF1Client::new(&sources)?),
//!     ergast.clone(),
//!     ergast,
//!     EngineConfig::default(),
//! );
//!
//! let payload = aggregator.build_season(2023).await?;
//! println!("{} drivers", payload.drivers.len());
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

mod aggregator;
mod config;
mod error;
mod fallback;
mod history;
mod reconciler;
mod types;

#[cfg(test)]
mod tests;

pub use aggregator::SeasonAggregator;
pub use config::EngineConfig;
pub use error::EngineError;
pub use fallback::{derive_from_laps, derive_from_positions};
pub use history::{ConstructorComparison, ConstructorHistory, HistoryReport};
pub use reconciler::{enrich, merge_points, resolve, Reconciler, Resolution};
pub use types::Reconciled;
