//! Trait definitions for external interactions
//!
//! These traits define the boundaries between domain logic and infrastructure.
//! Infrastructure implementations live in other crates.

use crate::season::StoredSeason;

/// Trait for persisting built season payloads
///
/// Implemented by the infrastructure layer (paddock-store)
pub trait SeasonStore: Send + Sync {
    /// Error type for store operations
    type Error;

    /// Load the payload for a season built under `schema_version`
    ///
    /// A stored payload with any other schema version is a miss (`Ok(None)`),
    /// never an error and never repaired in place.
    fn load_season(
        &self,
        season: i32,
        schema_version: u32,
    ) -> Result<Option<StoredSeason>, Self::Error>;

    /// Replace the stored payload for a season wholesale
    fn save_season(&self, stored: &StoredSeason) -> Result<(), Self::Error>;

    /// Remove the stored payload for a season, if any
    fn remove_season(&self, season: i32) -> Result<bool, Self::Error>;
}
