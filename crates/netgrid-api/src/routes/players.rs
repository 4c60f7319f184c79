//! Player enrollment and profile snapshots.

use axum::extract::State;
use axum::{Json, Router, routing::get, routing::post};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};
use uuid::Uuid;

use netgrid_authority::application::{command_handlers, query_handlers};
use netgrid_authority::domain::commands::EnrollPlayer;
use netgrid_core::store::PlayerRecord;

use crate::auth::PlayerIdentity;
use crate::error::ApiError;
use crate::state::AppState;

/// Request body for POST /enroll.
#[derive(Debug, Deserialize)]
pub struct EnrollRequest {
    /// Display handle.
    pub handle: String,
}

/// Denormalized profile snapshot for client display. Read-only: all
/// mutation goes through the Authority.
#[derive(Debug, Serialize)]
pub struct ProfileResponse {
    /// Player identifier.
    pub player_id: Uuid,
    /// Display handle.
    pub handle: String,
    /// Current level.
    pub level: i64,
    /// Lifetime experience.
    pub xp: i64,
    /// Nops balance.
    pub balance: i64,
    /// Commands unlocked through lessons.
    pub unlocked_commands: Vec<String>,
    /// Soft-ban flag.
    pub banned: bool,
    /// Account creation instant.
    pub created_at: DateTime<Utc>,
    /// Last mutation instant.
    pub updated_at: DateTime<Utc>,
}

impl From<PlayerRecord> for ProfileResponse {
    fn from(record: PlayerRecord) -> Self {
        Self {
            player_id: record.player_id,
            handle: record.handle,
            level: record.level,
            xp: record.xp,
            balance: record.balance,
            unlocked_commands: record.unlocked_commands,
            banned: record.banned,
            created_at: record.created_at,
            updated_at: record.updated_at,
        }
    }
}

/// POST /enroll
#[instrument(skip(state, request))]
async fn enroll(
    State(state): State<AppState>,
    PlayerIdentity(player_id): PlayerIdentity,
    Json(request): Json<EnrollRequest>,
) -> Result<Json<ProfileResponse>, ApiError> {
    let command = EnrollPlayer {
        correlation_id: Uuid::new_v4(),
        player_id,
        handle: request.handle,
    };

    info!(correlation_id = %command.correlation_id, %player_id, "handling enroll command");

    let record = command_handlers::handle_enroll_player(
        &command,
        state.clock.as_ref(),
        state.store.as_ref(),
    )
    .await?;

    Ok(Json(record.into()))
}

/// GET /me
#[instrument(skip(state))]
async fn me(
    State(state): State<AppState>,
    PlayerIdentity(player_id): PlayerIdentity,
) -> Result<Json<ProfileResponse>, ApiError> {
    let record = query_handlers::fetch_profile(player_id, state.store.as_ref()).await?;
    Ok(Json(record.into()))
}

/// Returns the players router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/enroll", post(enroll))
        .route("/me", get(me))
}
