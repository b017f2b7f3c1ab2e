//! Integration tests for the HTTP surface over mock providers

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use paddock_cache::{CacheConfig, CacheCoordinator, CacheState};
use paddock_domain::{FinishStatus, Provenance, RoundDescriptor, RoundResult, SeasonPayload, SessionKind};
use paddock_engine::{ConstructorComparison, EngineConfig, HistoryReport, SeasonAggregator};
use paddock_server::handlers::{create_router, AppState, ErrorResponse, HealthCheckResponse};
use paddock_sources::{MockHistorical, MockPrimary, MockSchedule, SourceError};
use paddock_store::JsonSeasonStore;
use std::sync::Arc;
use tower::ServiceExt; // for oneshot

struct TestApp {
    _dir: tempfile::TempDir,
    state: AppState,
}

impl TestApp {
    fn router(&self) -> Router {
        create_router(self.state.clone())
    }
}

fn row(code: &str, position: u32, points: f64, team: &str) -> RoundResult {
    RoundResult::new(code, Provenance::Primary)
        .with_position(position)
        .with_points(points)
        .with_team(team, None)
        .with_status(FinishStatus::Finished)
}

/// 2023 has one round with full data, 2019 has a failing schedule and 2030
/// has a schedule but no results anywhere.
fn create_test_app() -> TestApp {
    let primary = MockPrimary::new();
    let schedule = MockSchedule::new();

    schedule.add_season(2023, vec![RoundDescriptor::new(1, "Bahrain Grand Prix")]);
    primary.add_results(
        2023,
        1,
        SessionKind::Race,
        vec![
            row("VER", 1, 25.0, "Red Bull Racing").with_grid(1),
            row("HAM", 2, 18.0, "Mercedes").with_grid(2),
        ],
    );
    schedule.add_error(2019, SourceError::Communication("connection reset".into()));
    schedule.add_season(2030, vec![RoundDescriptor::new(1, "Future Grand Prix")]);

    let aggregator = SeasonAggregator::new(
        Arc::new(primary),
        Arc::new(MockHistorical::new()),
        Arc::new(schedule),
        EngineConfig::default(),
    );

    let dir = tempfile::tempdir().unwrap();
    let store = JsonSeasonStore::new(dir.path()).unwrap();
    let cache = CacheCoordinator::new(aggregator, store, CacheConfig::default());

    TestApp {
        _dir: dir,
        state: AppState::new(cache, 2022..=2023),
    }
}

async fn get(app: Router, uri: &str) -> axum::response::Response {
    let request = Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .unwrap();
    app.oneshot(request).await.unwrap()
}

async fn body_bytes(response: axum::response::Response) -> Vec<u8> {
    axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap()
        .to_vec()
}

#[tokio::test]
async fn test_health_check_endpoint() {
    let app = create_test_app();
    let response = get(app.router(), "/health").await;

    assert_eq!(response.status(), StatusCode::OK);

    let health: HealthCheckResponse = serde_json::from_slice(&body_bytes(response).await).unwrap();
    assert_eq!(health.status, "ok");
    assert!(health.seasons.is_empty());
    assert_eq!(health.metrics.builds_started, 0);
}

#[tokio::test]
async fn test_season_is_built_then_served_from_memory() {
    let app = create_test_app();

    let response = get(app.router(), "/season/2023").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()["cache-control"],
        "public, max-age=86400"
    );
    assert_eq!(response.headers()["x-cache-tier"], "built");

    let payload: SeasonPayload = serde_json::from_slice(&body_bytes(response).await).unwrap();
    assert_eq!(payload.season, 2023);
    let ver = &payload.drivers["VER"];
    assert_eq!(ver.total_points, 25.0);
    assert_eq!(ver.wins, 1);
    assert_eq!(ver.poles, 1);
    assert_eq!(payload.races[0].winner.as_ref().unwrap().code, "VER");

    let response = get(app.router(), "/season/2023").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()["x-cache-tier"], "memory");

    let response = get(app.router(), "/health").await;
    let health: HealthCheckResponse = serde_json::from_slice(&body_bytes(response).await).unwrap();
    assert_eq!(health.seasons.get(&2023), Some(&CacheState::Warm));
    assert_eq!(health.metrics.builds_succeeded, 1);
    assert_eq!(health.metrics.memory_hits, 1);
}

#[tokio::test]
async fn test_refresh_rebuilds() {
    let app = create_test_app();

    get(app.router(), "/season/2023").await;
    let response = get(app.router(), "/season/2023?refresh=true").await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()["x-cache-tier"], "built");
    assert_eq!(app.state.cache.metrics().builds_started, 2);
}

#[tokio::test]
async fn test_schedule_failure_is_bad_gateway() {
    let app = create_test_app();
    let response = get(app.router(), "/season/2019").await;

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    let error: ErrorResponse = serde_json::from_slice(&body_bytes(response).await).unwrap();
    assert!(error.error.contains("2019"));
}

#[tokio::test]
async fn test_empty_season_is_not_found() {
    let app = create_test_app();
    let response = get(app.router(), "/season/2030").await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert!(app.state.cache.cached_seasons().is_empty());
}

#[tokio::test]
async fn test_season_before_championship_is_rejected() {
    let app = create_test_app();
    let response = get(app.router(), "/season/1900").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_constructors_skip_unavailable_seasons() {
    let app = create_test_app();
    let response = get(app.router(), "/constructors").await;

    assert_eq!(response.status(), StatusCode::OK);
    let report: HistoryReport = serde_json::from_slice(&body_bytes(response).await).unwrap();
    assert_eq!(report.years, vec![2023]);

    let red_bull = &report.constructors["Red Bull Racing"];
    assert_eq!(red_bull.total_points, 25.0);
    assert_eq!(red_bull.standings_by_year[&2023], 1);
    assert_eq!(red_bull.origin.as_deref(), Some("Austria"));
}

#[tokio::test]
async fn test_compare_constructors() {
    let app = create_test_app();
    let response = get(
        app.router(),
        "/constructors/compare?constructor1=Mercedes&constructor2=Red%20Bull%20Racing",
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    let comparison: ConstructorComparison =
        serde_json::from_slice(&body_bytes(response).await).unwrap();
    assert_eq!(comparison.constructor1.name, "Mercedes");
    assert_eq!(comparison.constructor1.total_points, 18.0);
    assert_eq!(comparison.constructor2.wins, 1);
    assert_eq!(comparison.years, vec![2023]);
}

#[tokio::test]
async fn test_compare_unknown_constructor() {
    let app = create_test_app();
    let response = get(
        app.router(),
        "/constructors/compare?constructor1=Mercedes&constructor2=Brabham",
    )
    .await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let error: ErrorResponse = serde_json::from_slice(&body_bytes(response).await).unwrap();
    assert!(error.error.contains("Brabham"));
}

#[tokio::test]
async fn test_compare_requires_both_names() {
    let app = create_test_app();
    let response = get(app.router(), "/constructors/compare?constructor1=Mercedes").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
