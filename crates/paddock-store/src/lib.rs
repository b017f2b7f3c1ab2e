//! Paddock Storage Layer
//!
//! Implements the `SeasonStore` trait with one JSON file per season.
//!
//! # Architecture
//!
//! - File layout: `<dir>/season_<year>.json`
//! - Writes go to a temporary sibling first and are renamed into place, so a
//!   reader sees either the previous file or the complete new one
//! - A file stamped with another schema version is a miss, never an error
//!
//! # Examples
//!
//! ```
//! use paddock_domain::traits::SeasonStore;
//! use paddock_domain::{SeasonPayload, StoredSeason, SCHEMA_VERSION};
//! use paddock_store::JsonSeasonStore;
//!
//! let dir = tempfile::tempdir().unwrap();
//! let store = JsonSeasonStore::new(dir.path()).unwrap();
//!
//! let stored = StoredSeason {
//!     built_at: 1_700_000_000,
//!     payload: SeasonPayload::empty(2023, SCHEMA_VERSION),
//! };
//! store.save_season(&stored).unwrap();
//! assert_eq!(store.load_season(2023, SCHEMA_VERSION).unwrap(), Some(stored));
//! ```

#![warn(missing_docs)]

use paddock_domain::traits::SeasonStore;
use paddock_domain::{SeasonPayload, StoredSeason};
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::UNIX_EPOCH;
use thiserror::Error;
use tracing::{debug, warn};

/// Errors that can occur during storage operations
#[derive(Error, Debug)]
pub enum StoreError {
    /// Filesystem error
    #[error("I/O error on {path}: {source}")]
    Io {
        /// File or directory involved
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// Payload could not be serialized
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

static TMP_COUNTER: AtomicU64 = AtomicU64::new(0);

fn io_error(path: &Path) -> impl FnOnce(std::io::Error) -> StoreError + '_ {
    move |source| StoreError::Io {
        path: path.to_path_buf(),
        source,
    }
}

/// File-backed season store
///
/// Safe to share between threads: every operation works on whole files and
/// the rename in [`SeasonStore::save_season`] is atomic on one filesystem.
#[derive(Debug, Clone)]
pub struct JsonSeasonStore {
    dir: PathBuf,
}

impl JsonSeasonStore {
    /// Open a store rooted at `dir`, creating the directory if needed
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(io_error(&dir))?;
        Ok(Self { dir })
    }

    /// Root directory
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the file holding a season
    pub fn path_for(&self, season: i32) -> PathBuf {
        self.dir.join(format!("season_{}.json", season))
    }

    /// Seasons currently present on disk, in ascending order
    pub fn list_seasons(&self) -> Result<Vec<i32>, StoreError> {
        let mut seasons: Vec<i32> = fs::read_dir(&self.dir)
            .map_err(io_error(&self.dir))?
            .filter_map(|entry| entry.ok())
            .filter_map(|entry| {
                let name = entry.file_name();
                let name = name.to_str()?;
                name.strip_prefix("season_")?
                    .strip_suffix(".json")?
                    .parse()
                    .ok()
            })
            .collect();
        seasons.sort_unstable();
        Ok(seasons)
    }

    /// Decode a file body, treating anything unusable as a miss
    fn decode(
        &self,
        path: &Path,
        body: &str,
        season: i32,
        schema_version: u32,
    ) -> Option<StoredSeason> {
        let value: serde_json::Value = match serde_json::from_str(body) {
            Ok(value) => value,
            Err(e) => {
                warn!(season, path = %path.display(), error = %e, "discarding unreadable season file");
                return None;
            }
        };

        let stored_version = value.get("schema_version").and_then(|v| v.as_u64());
        if stored_version != Some(u64::from(schema_version)) {
            debug!(season, ?stored_version, schema_version, "schema mismatch, treating as miss");
            return None;
        }

        let built_at = value
            .get("built_at")
            .and_then(|v| v.as_u64())
            .or_else(|| modified_secs(path));

        let payload: SeasonPayload = match serde_json::from_value(value) {
            Ok(payload) => payload,
            Err(e) => {
                warn!(season, error = %e, "discarding season file with unexpected shape");
                return None;
            }
        };

        if payload.season != season {
            warn!(season, stored = payload.season, "season file holds another season");
            return None;
        }

        Some(StoredSeason {
            built_at: built_at.unwrap_or(0),
            payload,
        })
    }
}

fn modified_secs(path: &Path) -> Option<u64> {
    fs::metadata(path)
        .ok()?
        .modified()
        .ok()?
        .duration_since(UNIX_EPOCH)
        .ok()
        .map(|d| d.as_secs())
}

impl SeasonStore for JsonSeasonStore {
    type Error = StoreError;

    fn load_season(
        &self,
        season: i32,
        schema_version: u32,
    ) -> Result<Option<StoredSeason>, Self::Error> {
        let path = self.path_for(season);
        let body = match fs::read_to_string(&path) {
            Ok(body) => body,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(io_error(&path)(e)),
        };
        Ok(self.decode(&path, &body, season, schema_version))
    }

    fn save_season(&self, stored: &StoredSeason) -> Result<(), Self::Error> {
        let path = self.path_for(stored.payload.season);
        let tmp = self.dir.join(format!(
            ".season_{}.{}.{}.tmp",
            stored.payload.season,
            std::process::id(),
            TMP_COUNTER.fetch_add(1, Ordering::Relaxed)
        ));
        let body = serde_json::to_vec_pretty(stored)?;

        let mut file = fs::File::create(&tmp).map_err(io_error(&tmp))?;
        file.write_all(&body).map_err(io_error(&tmp))?;
        file.sync_all().map_err(io_error(&tmp))?;
        drop(file);

        if let Err(e) = fs::rename(&tmp, &path) {
            let _ = fs::remove_file(&tmp);
            return Err(io_error(&path)(e));
        }

        debug!(season = stored.payload.season, path = %path.display(), "season persisted");
        Ok(())
    }

    fn remove_season(&self, season: i32) -> Result<bool, Self::Error> {
        let path = self.path_for(season);
        match fs::remove_file(&path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(io_error(&path)(e)),
        }
    }
}
