//! Read-side queries. Clients only ever see denormalized snapshots; all
//! writes go through the command handlers.

use netgrid_core::error::DomainError;
use netgrid_core::store::{GameStore, PlayerRecord};
use uuid::Uuid;

/// Fetches a player profile snapshot for display.
///
/// # Errors
///
/// Returns `PlayerNotFound` when no account exists and `Infrastructure`
/// when the store misbehaves.
pub async fn fetch_profile(
    player_id: Uuid,
    store: &dyn GameStore,
) -> Result<PlayerRecord, DomainError> {
    store
        .load_player(player_id)
        .await?
        .ok_or(DomainError::PlayerNotFound(player_id))
}
