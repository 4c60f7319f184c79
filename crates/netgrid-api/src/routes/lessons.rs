//! The lesson shop endpoint.

use axum::extract::State;
use axum::{Json, Router, routing::post};
use serde::Deserialize;
use tracing::{info, instrument};
use uuid::Uuid;

use netgrid_authority::application::command_handlers;
use netgrid_authority::domain::commands::PurchaseLesson;
use netgrid_authority::domain::outcome::LessonOutcome;

use crate::auth::PlayerIdentity;
use crate::error::ApiError;
use crate::state::AppState;

/// Request body for POST /purchase.
#[derive(Debug, Deserialize)]
pub struct PurchaseRequest {
    /// The command the lesson teaches.
    pub command_id: String,
}

/// POST /purchase
#[instrument(skip(state, request), fields(command_id = %request.command_id))]
async fn purchase(
    State(state): State<AppState>,
    PlayerIdentity(player_id): PlayerIdentity,
    Json(request): Json<PurchaseRequest>,
) -> Result<Json<LessonOutcome>, ApiError> {
    let command = PurchaseLesson {
        correlation_id: Uuid::new_v4(),
        player_id,
        command_id: request.command_id,
    };

    info!(correlation_id = %command.correlation_id, %player_id, "handling purchase command");

    let outcome = command_handlers::handle_purchase_lesson(
        &command,
        &state.catalog,
        state.clock.as_ref(),
        state.store.as_ref(),
    )
    .await?;

    Ok(Json(outcome))
}

/// Returns the lessons router.
pub fn router() -> Router<AppState> {
    Router::new().route("/purchase", post(purchase))
}
