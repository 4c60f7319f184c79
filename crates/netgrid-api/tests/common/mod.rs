//! Shared test helpers for API integration tests.
#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use tower::ServiceExt;
use uuid::Uuid;

use netgrid_api::auth::PLAYER_HEADER;
use netgrid_api::routes;
use netgrid_api::state::AppState;
use netgrid_catalog::Catalog;
use netgrid_core::clock::Clock;
use netgrid_core::rng::DeterministicRng;
use netgrid_test_support::{FixedClock, MemoryGameStore, MockRng};

/// Fixed timestamp used across all integration tests.
pub fn fixed_instant() -> chrono::DateTime<chrono::Utc> {
    chrono::TimeZone::with_ymd_and_hms(&chrono::Utc, 2026, 3, 1, 9, 0, 0).unwrap()
}

/// Build the full app router over a fresh in-memory store with the given
/// RNG. Uses the same route structure as `main.rs`. The store handle is
/// returned for seeding and assertions.
pub fn build_test_app_with_rng<R>(rng: R) -> (Router, Arc<MemoryGameStore>)
where
    R: DeterministicRng + Send + 'static,
{
    let store = Arc::new(MemoryGameStore::new());
    let clock: Arc<dyn Clock + Send + Sync> = Arc::new(FixedClock(fixed_instant()));
    let rng: Arc<Mutex<dyn DeterministicRng + Send>> = Arc::new(Mutex::new(rng));
    let app_state = AppState::new(Arc::new(Catalog::builtin()), store.clone(), clock, rng);

    let app = Router::new()
        .merge(routes::health::router())
        .nest("/api/v1/catalog", routes::catalog::router())
        .nest("/api/v1/commands", routes::commands::router())
        .nest("/api/v1/players", routes::players::router())
        .nest("/api/v1/lessons", routes::lessons::router())
        .with_state(app_state);

    (app, store)
}

/// Build the full app router with the no-op `MockRng` (any positive success
/// probability succeeds with the minimum payout).
pub fn build_test_app() -> (Router, Arc<MemoryGameStore>) {
    build_test_app_with_rng(MockRng)
}

/// Send a POST request with a JSON body as the given player.
pub async fn post_json_as(
    app: &Router,
    player: Option<Uuid>,
    uri: &str,
    body: &serde_json::Value,
) -> (StatusCode, serde_json::Value) {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json");
    if let Some(player) = player {
        builder = builder.header(PLAYER_HEADER, player.to_string());
    }
    let request = builder
        .body(Body::from(serde_json::to_vec(body).unwrap()))
        .unwrap();

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let body_bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json: serde_json::Value = serde_json::from_slice(&body_bytes).unwrap();

    (status, json)
}

/// Send a GET request as the given player.
pub async fn get_json_as(
    app: &Router,
    player: Option<Uuid>,
    uri: &str,
) -> (StatusCode, serde_json::Value) {
    let mut builder = Request::builder().method("GET").uri(uri);
    if let Some(player) = player {
        builder = builder.header(PLAYER_HEADER, player.to_string());
    }
    let request = builder.body(Body::empty()).unwrap();

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let body_bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json: serde_json::Value = serde_json::from_slice(&body_bytes).unwrap();

    (status, json)
}

/// Enroll a fresh player through the API and return their id.
pub async fn enroll_player(app: &Router, handle: &str) -> Uuid {
    let player_id = Uuid::new_v4();
    let (status, _) = post_json_as(
        app,
        Some(player_id),
        "/api/v1/players/enroll",
        &serde_json::json!({ "handle": handle }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    player_id
}
