//! Integration tests for the health endpoint.

mod common;

use axum::http::StatusCode;

#[tokio::test]
async fn test_health_returns_ok_and_version() {
    let (app, _store) = common::build_test_app();

    let (status, json) = common::get_json_as(&app, None, "/health").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "ok");
    assert_eq!(json["service"], "netgrid-api");
    assert_eq!(json["version"], env!("CARGO_PKG_VERSION"));
}
