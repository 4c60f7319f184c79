//! Player identity extraction.
//!
//! Authentication itself happens upstream; the gateway terminates the
//! session and forwards the player id in a trusted header. The body of a
//! request is never consulted for identity.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use uuid::Uuid;

use crate::error::ApiError;

/// Header set by the authentication gateway.
pub const PLAYER_HEADER: &str = "x-netgrid-player";

/// The authenticated player, extracted from [`PLAYER_HEADER`].
#[derive(Debug, Clone, Copy)]
pub struct PlayerIdentity(pub Uuid);

impl<S> FromRequestParts<S> for PlayerIdentity
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(PLAYER_HEADER)
            .ok_or_else(|| ApiError::Unauthenticated("missing player identity".to_owned()))?;
        let value = header
            .to_str()
            .map_err(|_| ApiError::Unauthenticated("malformed player identity".to_owned()))?;
        let player_id = Uuid::parse_str(value)
            .map_err(|_| ApiError::Unauthenticated("malformed player identity".to_owned()))?;
        Ok(Self(player_id))
    }
}
