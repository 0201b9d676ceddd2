//! Tenant lifecycle routes.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::routing::delete;
use axum::{Json, Router};
use serde_json::json;

use crate::routes::ApiError;
use crate::state::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/brains/{brain_id}", delete(delete_brain))
        .route("/brains/{brain_id}/sources/{source_id}", delete(delete_source))
}

/// DELETE /brains/{brain_id} — remove every trace of a brain.
async fn delete_brain(
    State(state): State<Arc<AppState>>,
    Path(brain_id): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    state.lifecycle.delete_brain(&brain_id)?;
    state.forget_brain(&brain_id);
    Ok(Json(json!({ "deleted": brain_id })))
}

/// DELETE /brains/{brain_id}/sources/{source_id} — remove one source's
/// contribution; nodes still backed by other sources survive.
async fn delete_source(
    State(state): State<Arc<AppState>>,
    Path((brain_id, source_id)): Path<(String, String)>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let removed = state.lifecycle.delete_source(&source_id, &brain_id)?;
    state.forget_source(&brain_id, &source_id);
    Ok(Json(json!({
        "deleted": source_id,
        "removed_nodes": removed,
    })))
}
