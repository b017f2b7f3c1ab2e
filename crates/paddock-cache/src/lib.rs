//! Paddock Cache
//!
//! Tiered cache and build coordination in front of the season aggregator.
//!
//! # Overview
//!
//! Building a season costs dozens of upstream calls, so the coordinator makes
//! sure it happens at most once per cold season and never concurrently for
//! the same season:
//! - **Memory tier**: payloads shared as `Arc`, served while the schema
//!   matches and the entry is younger than the TTL
//! - **Persisted tier**: one schema-stamped JSON file per season, promoted
//!   to memory on hit
//! - **In-flight builds**: a per-season map of watch channels; late
//!   requests wait on the running build instead of starting their own
//!
//! # State Machine
//!
//! | State | Meaning | On request |
//! |-------|---------|------------|
//! | **Cold** | No memory entry | Load or build |
//! | **Building** | Load or build in flight | Wait, bounded by `build_wait_ms` |
//! | **Warm** | Fresh entry, current schema | Serve from memory |
//! | **Stale** | Expired or older schema | Treated as Cold |
//!
//! # Usage
//!
//! ```no_run
//! use paddock_cache::{CacheConfig, CacheCoordinator};
//! use paddock_engine::{EngineConfig, SeasonAggregator};
//! use paddock_sources::{ErgastClient, OpenF1Client, SourcesConfig};
//! use paddock_store::JsonSeasonStore;
//! use std::sync::Arc;
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
//! let cache = CacheCoordinator::new(
//!     aggregator,
//!     JsonSeasonStore::new("season_cache")?,
//!     CacheConfig::default(),
//! );
//!
//! let served = cache.get(2023, false).await?;
//! println!("{} drivers from {}", served.payload.drivers.len(), served.tier);
//! # Ok(())
//! # }
//! ```
//!
//! # Configuration
//!
//! ```toml
//! [cache]
//! ttl_secs = 86400
//! build_wait_ms = 30000
//! sweep_interval_secs = 600
//! ```

#![warn(missing_docs)]

mod builder;
mod config;
mod coordinator;
mod error;
mod metrics;
mod worker;

pub use builder::SeasonBuilder;
pub use config::CacheConfig;
pub use coordinator::{CacheCoordinator, CacheState, CacheTier, Served};
pub use error::CacheError;
pub use metrics::{CacheMetrics, MetricsSnapshot};
pub use worker::CacheJanitor;
