//! Background worker that keeps the memory tier clean

use crate::builder::SeasonBuilder;
use crate::coordinator::CacheCoordinator;
use paddock_domain::traits::SeasonStore;
use std::fmt;
use tokio::time::{interval, Duration};

/// Periodically evicts stale memory entries from a coordinator
///
/// # Examples
///
/// ```no_run
/// use paddock_cache::{CacheConfig, CacheCoordinator, CacheJanitor};
/// use paddock_engine::{EngineConfig, SeasonAggregator};
/// use paddock_sources::{ErgastClient, OpenF1Client, SourcesConfig};
/// use paddock_store::JsonSeasonStore;
/// use std::sync::Arc;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let sources = SourcesConfig::default();
///     let ergast = Arc::new(ErgastClient::new(&sources)?);
///     let aggregator = SeasonAggregator::new(
///         Arc::new(OpenF1Client::new(&sources)?),
///         ergast.clone(),
///         ergast,
///         EngineConfig::default(),
///     );
///     let store = JsonSeasonStore::new("season_cache")?;
///     let cache = CacheCoordinator::new(aggregator, store, CacheConfig::default());
///
///     // Run until Ctrl+C
///     CacheJanitor::new(cache).run().await;
///     Ok(())
/// }
/// ```
pub struct CacheJanitor<B, S> {
    cache: CacheCoordinator<B, S>,
    interval: Duration,
}

impl<B, S> CacheJanitor<B, S>
where
    B: SeasonBuilder,
    S: SeasonStore + 'static,
    S::Error: fmt::Display,
{
    /// Create a janitor sweeping at the coordinator's configured interval
    pub fn new(cache: CacheCoordinator<B, S>) -> Self {
        let interval = cache.config().sweep_interval();
        Self { cache, interval }
    }

    /// Override the sweep interval
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Sweep at the configured interval until Ctrl+C
    pub async fn run(&self) {
        let mut ticker = interval(self.interval);
        tracing::info!("Cache janitor started (interval: {:?})", self.interval);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let evicted = self.cache.sweep();
                    tracing::debug!("Sweep completed: {} evicted", evicted);
                }
                _ = tokio::signal::ctrl_c() => {
                    tracing::info!("Shutdown signal received, stopping cache janitor");
                    break;
                }
            }
        }

        tracing::info!(
            "Cache janitor stopped. Final metrics:\n{}",
            self.cache.metrics().summary()
        );
    }

    /// Run a fixed number of sweeps, the first one immediately
    ///
    /// Returns the total number of entries evicted.
    pub async fn run_cycles(&self, cycles: usize) -> usize {
        let mut ticker = interval(self.interval);
        let mut evicted = 0;

        for cycle in 0..cycles {
            ticker.tick().await;
            let swept = self.cache.sweep();
            tracing::debug!("Sweep {}/{} completed: {} evicted", cycle + 1, cycles, swept);
            evicted += swept;
        }

        evicted
    }
}
