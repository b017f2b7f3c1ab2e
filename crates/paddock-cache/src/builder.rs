//! The build seam between the cache and the aggregation engine

use async_trait::async_trait;
use paddock_domain::SeasonPayload;
use paddock_engine::{EngineError, SeasonAggregator};

/// Produces a fresh payload for one season
///
/// The coordinator calls [`SeasonBuilder::schema_version`] on every lookup,
/// so a builder whose version changes invalidates every cached entry built
/// under the old one.
#[async_trait]
pub trait SeasonBuilder: Send + Sync + 'static {
    /// Schema version new payloads are stamped with
    fn schema_version(&self) -> u32;

    /// Build the statistics for a season
    async fn build(&self, season: i32) -> Result<SeasonPayload, EngineError>;
}

#[async_trait]
impl SeasonBuilder for SeasonAggregator {
    fn schema_version(&self) -> u32 {
        SeasonAggregator::schema_version(self)
    }

    async fn build(&self, season: i32) -> Result<SeasonPayload, EngineError> {
        self.build_season(season).await
    }
}
