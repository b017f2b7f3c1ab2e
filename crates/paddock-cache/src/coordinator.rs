//! Tiered season cache with single-flight builds

use crate::builder::SeasonBuilder;
use crate::config::CacheConfig;
use crate::error::CacheError;
use crate::metrics::{CacheMetrics, MetricsSnapshot};
use paddock_domain::traits::SeasonStore;
use paddock_domain::{SeasonPayload, StoredSeason};
use paddock_engine::{EngineError, HistoryReport};
use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::ops::RangeInclusive;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

/// Tier that satisfied a request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheTier {
    /// In-process memory
    Memory,
    /// Persisted season file, promoted to memory
    Disk,
    /// Freshly built by the aggregator
    Built,
}

impl CacheTier {
    /// Value for the `X-Cache-Tier` response header
    pub fn as_str(&self) -> &'static str {
        match self {
            CacheTier::Memory => "memory",
            CacheTier::Disk => "disk",
            CacheTier::Built => "built",
        }
    }
}

impl fmt::Display for CacheTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle state of one season key in memory
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheState {
    /// No memory entry
    Cold,
    /// A build or load is in flight
    Building,
    /// Entry present, schema current, within TTL
    Warm,
    /// Entry present but expired or built under another schema
    Stale,
}

/// A payload together with the tier that produced it
#[derive(Debug, Clone)]
pub struct Served {
    /// The season statistics
    pub payload: Arc<SeasonPayload>,
    /// Where the payload came from
    pub tier: CacheTier,
}

#[derive(Debug, Clone)]
struct CacheEntry {
    payload: Arc<SeasonPayload>,
    built_at: u64,
    schema_version: u32,
}

type FlightResult = Result<(Arc<SeasonPayload>, CacheTier), CacheError>;
type FlightReceiver = watch::Receiver<Option<FlightResult>>;

struct Inner<B, S> {
    builder: B,
    store: S,
    config: CacheConfig,
    metrics: CacheMetrics,
    memory: RwLock<HashMap<i32, CacheEntry>>,
    in_flight: Mutex<HashMap<i32, FlightReceiver>>,
}

/// Removes a season from the in-flight map when its task ends, panics included
struct FlightGuard<B, S>
where
    B: SeasonBuilder,
    S: SeasonStore + 'static,
    S::Error: fmt::Display,
{
    inner: Arc<Inner<B, S>>,
    season: i32,
}

impl<B, S> Drop for FlightGuard<B, S>
where
    B: SeasonBuilder,
    S: SeasonStore + 'static,
    S::Error: fmt::Display,
{
    fn drop(&mut self) {
        self.inner.in_flight.lock().remove(&self.season);
    }
}

fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

impl<B, S> Inner<B, S>
where
    B: SeasonBuilder,
    S: SeasonStore + 'static,
    S::Error: fmt::Display,
{
    fn is_fresh(&self, built_at: u64, now: u64) -> bool {
        now.saturating_sub(built_at) < self.config.ttl_secs
    }

    fn entry_is_fresh(&self, entry: &CacheEntry, schema_version: u32, now: u64) -> bool {
        entry.schema_version == schema_version && self.is_fresh(entry.built_at, now)
    }

    fn fresh_memory(&self, season: i32, schema_version: u32) -> Option<Arc<SeasonPayload>> {
        let memory = self.memory.read();
        let entry = memory.get(&season)?;
        self.entry_is_fresh(entry, schema_version, now_secs())
            .then(|| Arc::clone(&entry.payload))
    }

    fn promote(&self, season: i32, payload: Arc<SeasonPayload>, built_at: u64) {
        let entry = CacheEntry {
            schema_version: payload.schema_version,
            payload,
            built_at,
        };
        self.memory.write().insert(season, entry);
    }

    async fn load_persisted(self: &Arc<Self>, season: i32, schema_version: u32) -> Option<StoredSeason> {
        let inner = Arc::clone(self);
        let loaded = tokio::task::spawn_blocking(move || {
            inner
                .store
                .load_season(season, schema_version)
                .map_err(|e| e.to_string())
        })
        .await;

        match loaded {
            Ok(Ok(stored)) => stored,
            Ok(Err(e)) => {
                warn!(season, error = %e, "persisted tier read failed, treating as miss");
                None
            }
            Err(e) => {
                warn!(season, error = %e, "persisted tier read task failed");
                None
            }
        }
    }

    async fn persist(self: &Arc<Self>, stored: StoredSeason) -> Result<StoredSeason, CacheError> {
        let inner = Arc::clone(self);
        let (stored, saved) = tokio::task::spawn_blocking(move || {
            let saved = inner.store.save_season(&stored).map_err(|e| e.to_string());
            (stored, saved)
        })
        .await
        .map_err(|e| CacheError::Store(e.to_string()))?;

        saved.map_err(CacheError::Store)?;
        Ok(stored)
    }

    /// Persisted tier first, then a build; runs inside the flight task
    async fn load_or_build(self: &Arc<Self>, season: i32, refresh: bool) -> FlightResult {
        let schema_version = self.builder.schema_version();

        if !refresh {
            if let Some(stored) = self.load_persisted(season, schema_version).await {
                if self.is_fresh(stored.built_at, now_secs()) {
                    let payload = Arc::new(stored.payload);
                    self.promote(season, Arc::clone(&payload), stored.built_at);
                    self.metrics.record_disk_hit();
                    debug!(season, "promoted persisted season to memory");
                    return Ok((payload, CacheTier::Disk));
                }
                debug!(season, built_at = stored.built_at, "persisted season expired");
            }
        }

        self.metrics.record_build_started();
        info!(season, refresh, "building season");

        let payload = match self.builder.build(season).await {
            Ok(payload) if payload.is_empty() => {
                self.metrics.record_build_failed();
                info!(season, "season build produced no drivers");
                return Err(EngineError::EmptySeason(season).into());
            }
            Ok(payload) => payload,
            Err(e) => {
                self.metrics.record_build_failed();
                error!(season, error = %e, "season build failed");
                return Err(e.into());
            }
        };

        let stored = StoredSeason {
            built_at: now_secs(),
            payload,
        };
        let stored = match self.persist(stored).await {
            Ok(stored) => stored,
            Err(e) => {
                self.metrics.record_build_failed();
                error!(season, error = %e, "could not persist season, cache left untouched");
                return Err(e);
            }
        };

        let payload = Arc::new(stored.payload);
        self.promote(season, Arc::clone(&payload), stored.built_at);
        self.metrics.record_build_succeeded();
        info!(season, drivers = payload.drivers.len(), "season built and cached");
        Ok((payload, CacheTier::Built))
    }
}

/// Three-tier cache in front of a [`SeasonBuilder`]
///
/// Reads go memory, then the persisted store (promoted on hit), then a
/// build. At most one load-or-build runs per season at a time; concurrent
/// requests for the same season wait on it, bounded by
/// [`CacheConfig::build_wait`]. Builds run as detached tasks, so a caller
/// that gives up does not cancel the build.
///
/// Cloning is cheap and every clone shares the same tiers.
pub struct CacheCoordinator<B, S> {
    inner: Arc<Inner<B, S>>,
}

impl<B, S> Clone for CacheCoordinator<B, S> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<B, S> CacheCoordinator<B, S>
where
    B: SeasonBuilder,
    S: SeasonStore + 'static,
    S::Error: fmt::Display,
{
    /// Create a coordinator over a builder and a persisted store
    pub fn new(builder: B, store: S, config: CacheConfig) -> Self {
        Self {
            inner: Arc::new(Inner {
                builder,
                store,
                config,
                metrics: CacheMetrics::new(),
                memory: RwLock::new(HashMap::new()),
                in_flight: Mutex::new(HashMap::new()),
            }),
        }
    }

    /// Active configuration
    pub fn config(&self) -> &CacheConfig {
        &self.inner.config
    }

    /// Current counter values
    pub fn metrics(&self) -> MetricsSnapshot {
        self.inner.metrics.snapshot()
    }

    /// Get the statistics for a season
    ///
    /// With `refresh` set, both cache tiers are bypassed and a build is
    /// forced. A refresh that finds a build in flight joins it; if that
    /// flight only loaded the persisted tier, a new build is started. The
    /// wait bound covers both.
    ///
    /// # Errors
    ///
    /// - [`CacheError::BuildInProgress`] when the wait bound elapses
    /// - [`CacheError::Build`] when the build fails or the season is empty
    /// - [`CacheError::Store`] when a built payload could not be persisted
    pub async fn get(&self, season: i32, refresh: bool) -> Result<Served, CacheError> {
        let schema_version = self.inner.builder.schema_version();

        if !refresh {
            if let Some(payload) = self.inner.fresh_memory(season, schema_version) {
                self.inner.metrics.record_memory_hit();
                return Ok(Served {
                    payload,
                    tier: CacheTier::Memory,
                });
            }
        }

        let deadline = tokio::time::Instant::now() + self.inner.config.build_wait();
        loop {
            let mut rx = {
                let mut in_flight = self.inner.in_flight.lock();
                match in_flight.get(&season) {
                    Some(rx) => {
                        self.inner.metrics.record_joined_waiter();
                        debug!(season, "joining in-flight build");
                        rx.clone()
                    }
                    None => {
                        // A flight may have finished between the first check and the lock.
                        if !refresh {
                            if let Some(payload) = self.inner.fresh_memory(season, schema_version) {
                                self.inner.metrics.record_memory_hit();
                                return Ok(Served {
                                    payload,
                                    tier: CacheTier::Memory,
                                });
                            }
                        }

                        let (tx, rx) = watch::channel(None);
                        in_flight.insert(season, rx.clone());
                        self.spawn_flight(season, refresh, tx);
                        rx
                    }
                }
            };

            let waited = tokio::time::timeout_at(deadline, rx.wait_for(Option::is_some)).await;

            let outcome = match waited {
                Ok(Ok(value)) => (*value).clone(),
                Ok(Err(_)) => None,
                Err(_) => {
                    self.inner.metrics.record_wait_timeout();
                    info!(season, "build still running after wait bound");
                    return Err(CacheError::BuildInProgress(season));
                }
            };

            match outcome.unwrap_or(Err(CacheError::BuildAborted(season))) {
                // The joined flight only read the persisted tier; a refresh still owes a build.
                Ok((_, CacheTier::Disk)) if refresh => {
                    debug!(season, "joined flight loaded from disk, starting refresh build");
                }
                result => return result.map(|(payload, tier)| Served { payload, tier }),
            }
        }
    }

    fn spawn_flight(&self, season: i32, refresh: bool, tx: watch::Sender<Option<FlightResult>>) {
        let inner = Arc::clone(&self.inner);
        tokio::spawn(async move {
            let guard = FlightGuard {
                inner: Arc::clone(&inner),
                season,
            };
            let result = inner.load_or_build(season, refresh).await;
            // Leave the in-flight map before waking waiters, so the next
            // request sees the promoted entry or starts a new flight.
            drop(guard);
            let _ = tx.send(Some(result));
        });
    }

    /// Report the memory state of a season key
    pub fn state(&self, season: i32) -> CacheState {
        if self.inner.in_flight.lock().contains_key(&season) {
            return CacheState::Building;
        }

        let schema_version = self.inner.builder.schema_version();
        match self.inner.memory.read().get(&season) {
            Some(entry) if self.inner.entry_is_fresh(entry, schema_version, now_secs()) => {
                CacheState::Warm
            }
            Some(_) => CacheState::Stale,
            None => CacheState::Cold,
        }
    }

    /// Seasons currently held in memory, fresh or not
    pub fn cached_seasons(&self) -> Vec<i32> {
        let mut seasons: Vec<i32> = self.inner.memory.read().keys().copied().collect();
        seasons.sort_unstable();
        seasons
    }

    /// Evict expired and schema-mismatched memory entries
    ///
    /// Returns the number of entries evicted.
    pub fn sweep(&self) -> usize {
        let schema_version = self.inner.builder.schema_version();
        let now = now_secs();

        let evicted = {
            let mut memory = self.inner.memory.write();
            let before = memory.len();
            memory.retain(|_, entry| self.inner.entry_is_fresh(entry, schema_version, now));
            before - memory.len()
        };

        self.inner.metrics.record_sweep(evicted);
        if evicted > 0 {
            debug!(evicted, "evicted stale seasons from memory");
        }
        evicted
    }

    /// Read a range of seasons through the cache, skipping failures
    pub async fn collect_seasons(
        &self,
        seasons: RangeInclusive<i32>,
        refresh: bool,
    ) -> Vec<Arc<SeasonPayload>> {
        let mut payloads = Vec::new();
        for season in seasons {
            match self.get(season, refresh).await {
                Ok(served) => payloads.push(served.payload),
                Err(e) => {
                    warn!(season, error = %e, "skipping season");
                }
            }
        }
        payloads
    }

    /// Combine constructor statistics over a range of seasons
    pub async fn constructor_history(
        &self,
        seasons: RangeInclusive<i32>,
        refresh: bool,
    ) -> HistoryReport {
        let payloads = self.collect_seasons(seasons, refresh).await;
        HistoryReport::combine(payloads.iter().map(|payload| &**payload))
    }
}
