//! Error types for cache operations

use paddock_engine::EngineError;
use thiserror::Error;

/// Errors that can reach a caller of the cache coordinator
///
/// Cloneable because one build outcome is shared by every waiter.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CacheError {
    /// The season build failed
    #[error("Build failed: {0}")]
    Build(#[from] EngineError),

    /// The built payload could not be persisted; neither tier was updated
    #[error("Storage error: {0}")]
    Store(String),

    /// A build for the season is running and did not finish within the wait bound
    #[error("Build in progress for season {0}")]
    BuildInProgress(i32),

    /// The build task ended without reporting an outcome
    #[error("Build aborted for season {0}")]
    BuildAborted(i32),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}
