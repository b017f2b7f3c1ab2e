//! Paddock Results Sources
//!
//! Pluggable adapters for the upstream providers a season is built from.
//!
//! # Architecture
//!
//! Three narrow async traits describe everything the engine needs from the
//! outside world:
//!
//! - [`PrimaryResultsProvider`]: rich per-session results plus lap data
//! - [`HistoricalResultsProvider`]: long-history results, coarser metadata
//! - [`ScheduleProvider`]: the rounds of a season
//!
//! Each trait has a deterministic mock for tests and an HTTP client for
//! production use.
//!
//! # Providers
//!
//! - [`MockPrimary`], [`MockHistorical`], [`MockSchedule`]: in-memory fixtures
//! - [`OpenF1Client`]: session-level primary provider
//! - [`ErgastClient`]: historical provider, also the schedule source
//!
//! # Examples
//!
//! ```
//! use paddock_domain::{Provenance, RoundResult, SessionKind};
//! use paddock_sources::{MockPrimary, PrimaryResultsProvider};
//!
//! # #[tokio::main]
//! # async fn main() {
//! let provider = MockPrimary::new();
//! provider.add_results(2023, 1, SessionKind::Race, vec![
//!     RoundResult::new("VER", Provenance::Primary).with_position(1).with_points(25.0),
//! ]);
//!
//! let rows = provider.fetch_session_results(2023, 1, SessionKind::Race).await.unwrap();
//! assert_eq!(rows[0].driver_code, "VER");
//! assert_eq!(provider.call_count(), 1);
//! # }
//! ```

#![warn(missing_docs)]

pub mod config;
pub mod ergast;
pub mod http;
pub mod mock;
pub mod openf1;

use async_trait::async_trait;
use paddock_domain::{LapRecord, RoundDescriptor, RoundResult, SessionKind};
use thiserror::Error;

pub use config::SourcesConfig;
pub use ergast::ErgastClient;
pub use http::{HttpFetcher, ResponseCache};
pub use mock::{MockHistorical, MockPrimary, MockSchedule};
pub use openf1::OpenF1Client;

/// Errors raised by results providers
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SourceError {
    /// Network or API communication error
    #[error("Communication error: {0}")]
    Communication(String),

    /// Payload could not be decoded
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// The provider has no such session, round or season
    #[error("Not found: {0}")]
    NotFound(String),

    /// Rate limit exceeded and retries exhausted
    #[error("Rate limit exceeded")]
    RateLimitExceeded,

    /// The provider does not offer this kind of data
    #[error("Unsupported by provider: {0}")]
    Unsupported(&'static str),
}

impl SourceError {
    /// Whether the failure means "no data" rather than "provider broken"
    pub fn is_not_found(&self) -> bool {
        matches!(self, SourceError::NotFound(_))
    }
}

/// Rich session-level provider
///
/// Expected to carry driver codes, numbers, names, team colors and classified
/// status for every row it returns.
#[async_trait]
pub trait PrimaryResultsProvider: Send + Sync {
    /// Classified results of one session of a round
    async fn fetch_session_results(
        &self,
        season: i32,
        round: u32,
        kind: SessionKind,
    ) -> Result<Vec<RoundResult>, SourceError>;

    /// Lap-by-lap running order of the grand prix
    async fn fetch_race_laps(&self, season: i32, round: u32)
        -> Result<Vec<LapRecord>, SourceError>;
}

/// Long-history provider with authoritative points
#[async_trait]
pub trait HistoricalResultsProvider: Send + Sync {
    /// Grand prix results
    async fn fetch_race_results(
        &self,
        season: i32,
        round: u32,
    ) -> Result<Vec<RoundResult>, SourceError>;

    /// Qualifying classification
    async fn fetch_qualifying_results(
        &self,
        season: i32,
        round: u32,
    ) -> Result<Vec<RoundResult>, SourceError>;

    /// Sprint results
    async fn fetch_sprint_results(
        &self,
        _season: i32,
        _round: u32,
    ) -> Result<Vec<RoundResult>, SourceError> {
        Err(SourceError::Unsupported("sprint results"))
    }
}

/// Source of the ordered rounds of a season
#[async_trait]
pub trait ScheduleProvider: Send + Sync {
    /// Rounds of the season, testing events excluded
    async fn fetch_season_schedule(&self, season: i32)
        -> Result<Vec<RoundDescriptor>, SourceError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    struct RaceOnly;

    #[async_trait]
    impl HistoricalResultsProvider for RaceOnly {
        async fn fetch_race_results(
            &self,
            _season: i32,
            _round: u32,
        ) -> Result<Vec<RoundResult>, SourceError> {
            Ok(Vec::new())
        }

        async fn fetch_qualifying_results(
            &self,
            _season: i32,
            _round: u32,
        ) -> Result<Vec<RoundResult>, SourceError> {
            Ok(Vec::new())
        }
    }

    #[tokio::test]
    async fn test_sprint_results_unsupported_by_default() {
        let err = RaceOnly.fetch_sprint_results(2023, 4).await.unwrap_err();
        assert_eq!(err, SourceError::Unsupported("sprint results"));
        assert!(!err.is_not_found());
    }

    #[test]
    fn test_error_display() {
        let err = SourceError::NotFound("2023 round 30".to_string());
        assert_eq!(err.to_string(), "Not found: 2023 round 30");
        assert!(err.is_not_found());
    }
}
