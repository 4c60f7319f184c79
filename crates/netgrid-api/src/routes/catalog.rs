//! Catalog listing for client display.

use axum::extract::State;
use axum::{Json, Router, routing::get};
use netgrid_catalog::CommandDefinition;
use serde::Serialize;

use crate::state::AppState;

/// Response body for GET /.
#[derive(Debug, Serialize)]
pub struct CatalogResponse {
    /// Every configured command, in catalog order.
    pub commands: Vec<CommandDefinition>,
}

/// GET /
async fn list_catalog(State(state): State<AppState>) -> Json<CatalogResponse> {
    Json(CatalogResponse {
        commands: state.catalog.commands().to_vec(),
    })
}

/// Returns the catalog router.
pub fn router() -> Router<AppState> {
    Router::new().route("/", get(list_catalog))
}
