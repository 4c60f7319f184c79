//! Integration tests for the command-execution endpoint: the phish
//! scenario end to end, idempotent replay, cooldown gating, locking, and
//! the error-code mapping.

mod common;

use axum::http::StatusCode;
use netgrid_test_support::SequenceRng;
use uuid::Uuid;

#[tokio::test]
async fn test_execute_phish_pays_and_arms_cooldown() {
    // Success roll 0.600 < 0.71, payout offset 2 → 3 nops.
    let (app, _store) = common::build_test_app_with_rng(SequenceRng::new(vec![600, 2]));
    let player_id = common::enroll_player(&app, "operator").await;

    let (status, json) = common::post_json_as(
        &app,
        Some(player_id),
        "/api/v1/commands/execute",
        &serde_json::json!({ "command_id": "phish", "trace_id": "t-1" }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["ok"], true);
    assert_eq!(json["reason"], "SUCCESS");
    assert_eq!(json["delta"], 3);
    assert_eq!(json["xp"], 4);
    assert_eq!(json["balance"], 3);
    assert_eq!(json["cooldown_secs_remaining"], 12);
    assert_eq!(json["trace_id"], "t-1");

    // The profile snapshot reflects the commit.
    let (_, profile) = common::get_json_as(&app, Some(player_id), "/api/v1/players/me").await;
    assert_eq!(profile["balance"], 3);
    assert_eq!(profile["xp"], 4);
}

#[tokio::test]
async fn test_execute_failure_clamps_at_zero() {
    // Failure roll 0.999 >= 0.71; the -2 penalty clamps against 0.
    let (app, _store) = common::build_test_app_with_rng(SequenceRng::new(vec![999]));
    let player_id = common::enroll_player(&app, "operator").await;

    let (status, json) = common::post_json_as(
        &app,
        Some(player_id),
        "/api/v1/commands/execute",
        &serde_json::json!({ "command_id": "phish", "trace_id": "t-1" }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["ok"], false);
    assert_eq!(json["reason"], "FAILED");
    assert_eq!(json["delta"], -2);
    assert_eq!(json["xp"], 1);
    assert_eq!(json["balance"], 0);
}

#[tokio::test]
async fn test_execute_within_cooldown_is_policy_rejection_not_error() {
    let (app, _store) = common::build_test_app_with_rng(SequenceRng::new(vec![600, 2]));
    let player_id = common::enroll_player(&app, "operator").await;

    common::post_json_as(
        &app,
        Some(player_id),
        "/api/v1/commands/execute",
        &serde_json::json!({ "command_id": "phish", "trace_id": "t-1" }),
    )
    .await;

    // Second attempt with a fresh token, still inside the 12-second gate.
    let (status, json) = common::post_json_as(
        &app,
        Some(player_id),
        "/api/v1/commands/execute",
        &serde_json::json!({ "command_id": "phish", "trace_id": "t-2" }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["ok"], false);
    assert_eq!(json["reason"], "COOLDOWN");
    // Policy rejections carry no delta/xp fields at all.
    assert!(json.get("delta").is_none());
    assert!(json.get("xp").is_none());
    assert_eq!(json["balance"], 3);
    assert_eq!(json["cooldown_secs_remaining"], 12);
}

#[tokio::test]
async fn test_execute_replay_returns_original_outcome() {
    let (app, store) = common::build_test_app_with_rng(SequenceRng::new(vec![600, 2]));
    let player_id = common::enroll_player(&app, "operator").await;

    let body = serde_json::json!({ "command_id": "phish", "trace_id": "t-dup" });
    let (_, first) =
        common::post_json_as(&app, Some(player_id), "/api/v1/commands/execute", &body).await;
    let (status, second) =
        common::post_json_as(&app, Some(player_id), "/api/v1/commands/execute", &body).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(second, first);
    // Paid exactly once.
    assert_eq!(store.player_snapshot(player_id).unwrap().balance, 3);
}

#[tokio::test]
async fn test_execute_locked_command_is_rejected_without_payout() {
    let (app, store) = common::build_test_app();
    let player_id = common::enroll_player(&app, "operator").await;

    let (status, json) = common::post_json_as(
        &app,
        Some(player_id),
        "/api/v1/commands/execute",
        &serde_json::json!({ "command_id": "crack", "trace_id": "t-1" }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["ok"], false);
    assert_eq!(json["reason"], "LOCKED");
    assert!(json.get("delta").is_none());
    assert_eq!(store.player_snapshot(player_id).unwrap().balance, 0);
}

#[tokio::test]
async fn test_execute_unknown_command_is_invalid_argument() {
    let (app, store) = common::build_test_app();
    let player_id = common::enroll_player(&app, "operator").await;

    let (status, json) = common::post_json_as(
        &app,
        Some(player_id),
        "/api/v1/commands/execute",
        &serde_json::json!({ "command_id": "nonexistent", "trace_id": "t-1" }),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "invalid_argument");
    // Nothing persisted for caller errors.
    assert_eq!(store.trace_count(), 0);
}

#[tokio::test]
async fn test_execute_blank_trace_id_is_invalid_argument() {
    let (app, _store) = common::build_test_app();
    let player_id = common::enroll_player(&app, "operator").await;

    let (status, json) = common::post_json_as(
        &app,
        Some(player_id),
        "/api/v1/commands/execute",
        &serde_json::json!({ "command_id": "phish", "trace_id": "  " }),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "invalid_argument");
}

#[tokio::test]
async fn test_execute_without_identity_is_unauthenticated() {
    let (app, _store) = common::build_test_app();

    let (status, json) = common::post_json_as(
        &app,
        None,
        "/api/v1/commands/execute",
        &serde_json::json!({ "command_id": "phish", "trace_id": "t-1" }),
    )
    .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(json["error"], "unauthenticated");
}

#[tokio::test]
async fn test_execute_before_enrollment_is_failed_precondition() {
    let (app, _store) = common::build_test_app();

    let (status, json) = common::post_json_as(
        &app,
        Some(Uuid::new_v4()),
        "/api/v1/commands/execute",
        &serde_json::json!({ "command_id": "phish", "trace_id": "t-1" }),
    )
    .await;

    assert_eq!(status, StatusCode::PRECONDITION_FAILED);
    assert_eq!(json["error"], "failed_precondition");
}
