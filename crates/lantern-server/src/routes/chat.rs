//! Chat route.

use super::{api_error, ApiError};
use crate::state::AppState;
use axum::{extract::State, Json};
use lantern_types::{ChatRequest, ChatTurn};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::info;

/// POST /api/chat - Run one chat turn.
///
/// The inference call is cancelled if the client goes away before it
/// finishes.
pub async fn send(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ChatRequest>,
) -> Result<Json<ChatTurn>, ApiError> {
    let cancel = CancellationToken::new();
    let _guard = cancel.clone().drop_guard();

    let turn = state.orchestrator.chat(req, &cancel).await.map_err(api_error)?;
    info!(target: "lantern::api", "Chat reply for session {} ({})", turn.session_id, turn.model);
    Ok(Json(turn))
}
