//! The command-execution endpoint.

use axum::extract::State;
use axum::{Json, Router, routing::post};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};
use uuid::Uuid;

use netgrid_authority::application::command_handlers;
use netgrid_authority::domain::commands::ExecuteCommand;
use netgrid_authority::domain::outcome::{InvocationOutcome, OutcomeReason};
use netgrid_core::clock::Clock;
use netgrid_core::error::DomainError;

use crate::auth::PlayerIdentity;
use crate::error::ApiError;
use crate::state::AppState;

/// Request body for POST /execute. Identity comes from the gateway header,
/// never from here.
#[derive(Debug, Deserialize)]
pub struct ExecuteRequest {
    /// The catalog command to run.
    pub command_id: String,
    /// Caller-generated idempotency token, unique per logical attempt.
    pub trace_id: String,
}

/// Response body for POST /execute. Policy rejections (`LOCKED`,
/// `COOLDOWN`) come back `ok: false` with `delta`/`xp` absent.
#[derive(Debug, Serialize)]
pub struct ExecuteResponse {
    /// True only for a successful roll.
    pub ok: bool,
    /// Outcome classification.
    pub reason: OutcomeReason,
    /// Balance delta, present only for rolled outcomes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delta: Option<i64>,
    /// Experience granted, present only for rolled outcomes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub xp: Option<i64>,
    /// Balance after the attempt.
    pub balance: i64,
    /// Seconds until the command is invokable again.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cooldown_secs_remaining: Option<i64>,
    /// When the command becomes invokable again.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_eligible_at: Option<DateTime<Utc>>,
    /// Echo of the caller's idempotency token.
    pub trace_id: String,
}

impl ExecuteResponse {
    fn from_outcome(outcome: InvocationOutcome, now: DateTime<Utc>) -> Self {
        let rolled = matches!(outcome.reason, OutcomeReason::Success | OutcomeReason::Failed);
        Self {
            ok: outcome.ok,
            reason: outcome.reason,
            delta: rolled.then_some(outcome.delta),
            xp: rolled.then_some(outcome.xp_gained),
            balance: outcome.balance,
            cooldown_secs_remaining: outcome
                .next_eligible_at
                .map(|at| (at - now).num_seconds().max(0)),
            next_eligible_at: outcome.next_eligible_at,
            trace_id: outcome.trace_id,
        }
    }
}

/// POST /execute
#[instrument(skip(state, request), fields(command_id = %request.command_id))]
async fn execute(
    State(state): State<AppState>,
    PlayerIdentity(player_id): PlayerIdentity,
    Json(request): Json<ExecuteRequest>,
) -> Result<Json<ExecuteResponse>, ApiError> {
    if request.trace_id.trim().is_empty() {
        return Err(DomainError::Validation("trace_id must not be blank".to_owned()).into());
    }

    let command = ExecuteCommand {
        correlation_id: Uuid::new_v4(),
        player_id,
        command_id: request.command_id,
        trace_id: request.trace_id,
    };

    info!(correlation_id = %command.correlation_id, %player_id, "handling execute command");

    let outcome = command_handlers::handle_execute_command(
        &command,
        &state.catalog,
        state.clock.as_ref(),
        &state.rng,
        state.store.as_ref(),
    )
    .await?;

    Ok(Json(ExecuteResponse::from_outcome(outcome, state.clock.now())))
}

/// Returns the command-execution router.
pub fn router() -> Router<AppState> {
    Router::new().route("/execute", post(execute))
}
