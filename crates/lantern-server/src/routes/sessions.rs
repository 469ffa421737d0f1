//! Chat session routes.

use super::{api_error, ApiError};
use crate::state::AppState;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use lantern_core::DEFAULT_SESSION_LIST_LIMIT;
use lantern_types::{ChatMessage, ChatSession};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

#[derive(Deserialize)]
pub struct ListSessionsQuery {
    #[serde(default = "default_limit")]
    pub limit: i64,
}

fn default_limit() -> i64 {
    DEFAULT_SESSION_LIST_LIMIT
}

#[derive(Serialize)]
pub struct SessionListResponse {
    pub sessions: Vec<ChatSession>,
}

/// GET /api/sessions - Most recently active sessions first.
pub async fn list(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListSessionsQuery>,
) -> Result<Json<SessionListResponse>, ApiError> {
    let sessions = state.chats.list_sessions(query.limit).map_err(api_error)?;
    Ok(Json(SessionListResponse { sessions }))
}

#[derive(Deserialize, Default)]
pub struct CreateSessionRequest {
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
}

/// POST /api/sessions - Create a session seeded with the system prompt.
pub async fn create(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateSessionRequest>,
) -> Result<(StatusCode, Json<ChatSession>), ApiError> {
    let session = state
        .orchestrator
        .create_session(req.model.as_deref(), req.title.as_deref())
        .map_err(api_error)?;
    info!(target: "lantern::api", "Created session {}", session.session_id);
    Ok((StatusCode::CREATED, Json(session)))
}

#[derive(Serialize)]
pub struct SessionDetailResponse {
    pub session: ChatSession,
    pub messages: Vec<ChatMessage>,
}

/// GET /api/sessions/{id} - Session with its full history.
pub async fn get(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<SessionDetailResponse>, ApiError> {
    let session = state.chats.get_session(&id).map_err(api_error)?;
    let messages = state.chats.get_messages(&id).map_err(api_error)?;
    Ok(Json(SessionDetailResponse { session, messages }))
}

#[derive(Deserialize)]
pub struct UpdateTitleRequest {
    pub title: String,
}

/// PUT /api/sessions/{id}/title
pub async fn update_title(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(req): Json<UpdateTitleRequest>,
) -> Result<Json<ChatSession>, ApiError> {
    state
        .chats
        .update_session_title(&id, &req.title)
        .map_err(api_error)?;
    let session = state.chats.get_session(&id).map_err(api_error)?;
    Ok(Json(session))
}

/// DELETE /api/sessions/{id} - Delete a session and its messages.
pub async fn delete(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    state.chats.delete_session(&id).map_err(api_error)?;
    info!(target: "lantern::api", "Deleted session {}", id);
    Ok(StatusCode::NO_CONTENT)
}
