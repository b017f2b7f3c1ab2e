//! Paddock Server
//!
//! HTTP surface for season statistics and constructor history.
//!
//! | Route | Result |
//! |-------|--------|
//! | `GET /season/:year?refresh=bool` | Season payload, `X-Cache-Tier` header |
//! | `GET /constructors?refresh=bool` | Constructor history over the configured seasons |
//! | `GET /constructors/compare?constructor1=..&constructor2=..` | Two constructors side by side |
//! | `GET /health` | Liveness, cache state and counters |

#![warn(missing_docs)]

pub mod config;
pub mod handlers;

use config::ServerConfig;
use handlers::{create_router, AppState};
use paddock_cache::{CacheCoordinator, CacheJanitor};
use paddock_engine::SeasonAggregator;
use paddock_sources::{ErgastClient, OpenF1Client, SourceError};
use paddock_store::{JsonSeasonStore, StoreError};
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Server error
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    /// Server binding error
    #[error("Failed to bind server: {0}")]
    Bind(#[from] std::io::Error),

    /// The season directory could not be opened
    #[error("Season store error: {0}")]
    Store(#[from] StoreError),

    /// An upstream client could not be constructed
    #[error("Source client error: {0}")]
    Source(#[from] SourceError),

    /// Server error
    #[error("Server error: {0}")]
    Server(String),
}

/// Initialize logging from `RUST_LOG`, defaulting to `info`
///
/// Safe to call more than once; later calls are ignored.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

/// Wire the upstream clients, aggregator, store and cache from configuration
pub fn build_state(config: &ServerConfig) -> Result<AppState, ServerError> {
    let ergast = Arc::new(ErgastClient::new(&config.sources)?);
    let aggregator = SeasonAggregator::new(
        Arc::new(OpenF1Client::new(&config.sources)?),
        ergast.clone(),
        ergast,
        config.engine.clone(),
    );
    let store = JsonSeasonStore::new(&config.season_cache_dir)?;
    let cache = CacheCoordinator::new(aggregator, store, config.cache.clone());

    Ok(AppState::new(cache, config.engine.history_seasons()))
}

/// Start the HTTP server
///
/// Builds the application state, spawns the cache janitor, and serves until
/// Ctrl+C.
pub async fn start_server(config: ServerConfig) -> Result<(), ServerError> {
    init_tracing();
    config.validate()?;

    info!("Starting Paddock server");
    info!("Bind address: {}", config.bind_addr());
    info!("Season cache: {}", config.season_cache_dir.display());
    info!(
        "Cache TTL: {} seconds, build wait: {} ms",
        config.cache.ttl_secs, config.cache.build_wait_ms
    );

    let state = build_state(&config)?;

    let janitor = CacheJanitor::new(state.cache.clone());
    tokio::spawn(async move { janitor.run().await });

    let app = create_router(state);

    let listener = TcpListener::bind(&config.bind_addr()).await?;
    info!("Server listening on {}", config.bind_addr());

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await
        .map_err(|e| ServerError::Server(e.to_string()))?;

    info!("Server stopped");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_state() {
        let dir = tempfile::tempdir().unwrap();
        let config = ServerConfig {
            season_cache_dir: dir.path().join("seasons"),
            ..ServerConfig::default_test_config()
        };

        let state = build_state(&config).unwrap();
        assert_eq!(state.history_seasons, 2018..=2025);
        assert!(state.cache.cached_seasons().is_empty());
        assert!(dir.path().join("seasons").is_dir());
    }
}
