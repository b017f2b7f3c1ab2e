//! HTTP request handlers for the season statistics service.
//!
//! Every route reads through the shared [`CacheCoordinator`]; nothing here
//! talks to an upstream provider directly.

use axum::{
    extract::{Path, Query, State},
    http::{header, HeaderName, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::get,
    Router,
};
use paddock_cache::{CacheCoordinator, CacheError, CacheState, MetricsSnapshot};
use paddock_engine::{ConstructorComparison, EngineError, HistoryReport, SeasonAggregator};
use paddock_store::JsonSeasonStore;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::ops::RangeInclusive;
use tracing::error;

/// Earliest season the service accepts
pub const MIN_SEASON: i32 = 1950;

/// `Cache-Control` value sent with every season payload
pub const SEASON_CACHE_CONTROL: &str = "public, max-age=86400";

/// Header naming the tier that served a season
pub const CACHE_TIER_HEADER: &str = "x-cache-tier";

/// The coordinator type the server runs
pub type SeasonCache = CacheCoordinator<SeasonAggregator, JsonSeasonStore>;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Tiered season cache
    pub cache: SeasonCache,
    /// Seasons combined by the constructor routes
    pub history_seasons: RangeInclusive<i32>,
}

impl AppState {
    /// Create state over a cache and a history range
    pub fn new(cache: SeasonCache, history_seasons: RangeInclusive<i32>) -> Self {
        Self {
            cache,
            history_seasons,
        }
    }
}

/// `?refresh=` query parameter
#[derive(Debug, Default, Deserialize)]
pub struct RefreshParams {
    /// Bypass both cache tiers
    #[serde(default)]
    pub refresh: bool,
}

/// Query parameters of the comparison route
#[derive(Debug, Deserialize)]
pub struct CompareParams {
    /// First constructor name
    pub constructor1: String,
    /// Second constructor name
    pub constructor2: String,
    /// Bypass both cache tiers
    #[serde(default)]
    pub refresh: bool,
}

/// Health check response
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthCheckResponse {
    /// Overall health status
    pub status: String,
    /// Memory state of every season held in memory
    pub seasons: BTreeMap<i32, CacheState>,
    /// Cache counters
    pub metrics: MetricsSnapshot,
}

/// Error response
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Error message
    pub error: String,
}

/// Application error type
#[derive(Debug)]
pub enum AppError {
    /// Error from the cache coordinator
    Cache(CacheError),
    /// Error from constructor lookups
    Engine(EngineError),
    /// Malformed request
    BadRequest(String),
}

impl AppError {
    fn status(&self) -> StatusCode {
        match self {
            AppError::Cache(CacheError::BuildInProgress(_)) => StatusCode::ACCEPTED,
            AppError::Cache(CacheError::Build(e)) | AppError::Engine(e) => match e {
                EngineError::ScheduleUnavailable { .. } => StatusCode::BAD_GATEWAY,
                EngineError::EmptySeason(_)
                | EngineError::UnknownConstructor(_)
                | EngineError::NoResultsAvailable { .. } => StatusCode::NOT_FOUND,
                EngineError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            AppError::Cache(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
        }
    }

    fn message(&self) -> String {
        match self {
            AppError::Cache(e) => e.to_string(),
            AppError::Engine(e) => e.to_string(),
            AppError::BadRequest(msg) => msg.clone(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = self.message();
        if status.is_server_error() {
            error!(%status, error = %message, "request failed");
        }

        let body = Json(ErrorResponse { error: message });
        (status, body).into_response()
    }
}

impl From<CacheError> for AppError {
    fn from(e: CacheError) -> Self {
        AppError::Cache(e)
    }
}

impl From<EngineError> for AppError {
    fn from(e: EngineError) -> Self {
        AppError::Engine(e)
    }
}

/// GET /season/:year - Season statistics per driver and constructor
async fn get_season(
    State(state): State<AppState>,
    Path(year): Path<i32>,
    Query(params): Query<RefreshParams>,
) -> Result<Response, AppError> {
    if year < MIN_SEASON {
        return Err(AppError::BadRequest(format!(
            "season must be {} or later",
            MIN_SEASON
        )));
    }

    let served = state.cache.get(year, params.refresh).await?;
    let headers = [
        (header::CACHE_CONTROL, SEASON_CACHE_CONTROL),
        (HeaderName::from_static(CACHE_TIER_HEADER), served.tier.as_str()),
    ];

    Ok((headers, Json(served.payload.as_ref().clone())).into_response())
}

/// GET /constructors - Constructor history over the configured seasons
async fn list_constructors(
    State(state): State<AppState>,
    Query(params): Query<RefreshParams>,
) -> Json<HistoryReport> {
    let report = state
        .cache
        .constructor_history(state.history_seasons.clone(), params.refresh)
        .await;
    Json(report)
}

/// GET /constructors/compare - Two constructors side by side
async fn compare_constructors(
    State(state): State<AppState>,
    Query(params): Query<CompareParams>,
) -> Result<Json<ConstructorComparison>, AppError> {
    let report = state
        .cache
        .constructor_history(state.history_seasons.clone(), params.refresh)
        .await;
    let comparison = report.compare(&params.constructor1, &params.constructor2)?;
    Ok(Json(comparison))
}

/// GET /health - Liveness plus cache state
async fn health_check(State(state): State<AppState>) -> Json<HealthCheckResponse> {
    let seasons = state
        .cache
        .cached_seasons()
        .into_iter()
        .map(|season| (season, state.cache.state(season)))
        .collect();

    Json(HealthCheckResponse {
        status: "ok".to_string(),
        seasons,
        metrics: state.cache.metrics(),
    })
}

/// Create the axum router with all routes
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/season/:year", get(get_season))
        .route("/constructors", get(list_constructors))
        .route("/constructors/compare", get(compare_constructors))
        .route("/health", get(health_check))
        .with_state(state)
}
