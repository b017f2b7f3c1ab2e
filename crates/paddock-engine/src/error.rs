//! Error types for the engine

use paddock_sources::SourceError;
use thiserror::Error;

/// Errors that can occur while reconciling rounds and building seasons
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EngineError {
    /// No source yielded a usable classification for the round
    #[error("No results available for {season} round {round}")]
    NoResultsAvailable {
        /// Season year
        season: i32,
        /// Round number
        round: u32,
    },

    /// The season schedule could not be fetched
    #[error("Schedule unavailable for {season}: {source}")]
    ScheduleUnavailable {
        /// Season year
        season: i32,
        /// Provider failure
        #[source]
        source: SourceError,
    },

    /// Every round of the season was skipped
    #[error("No driver results for season {0}")]
    EmptySeason(i32),

    /// Constructor lookup in a history report failed
    #[error("Constructor '{0}' not found")]
    UnknownConstructor(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}
