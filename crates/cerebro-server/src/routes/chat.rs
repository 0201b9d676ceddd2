//! Chat history routes.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::routing::get;
use axum::{Json, Router};

use crate::routes::ApiError;
use crate::state::AppState;
use cerebro_core::ChatRecord;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/chat/{brain_id}", get(get_history))
}

/// GET /chat/{brain_id} — a brain's question/answer history, oldest first.
async fn get_history(
    State(state): State<Arc<AppState>>,
    Path(brain_id): Path<String>,
) -> Result<Json<Vec<ChatRecord>>, ApiError> {
    Ok(Json(state.chat.history(&brain_id)?))
}
