//! HTTP route handlers.

pub mod chat;
pub mod files;
pub mod models;
pub mod sessions;
pub mod settings;

use crate::state::AppState;
use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post, put},
    Json, Router,
};
use lantern_core::{DatabaseStats, LanternError};
use serde::Serialize;
use std::sync::Arc;
use tracing::error;

/// Error half of every handler result.
pub type ApiError = (StatusCode, String);

/// Map a core error onto a status code.
pub fn api_error(e: LanternError) -> ApiError {
    let status = match &e {
        LanternError::NotFound { .. } => StatusCode::NOT_FOUND,
        LanternError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
        LanternError::UpstreamFailed(_) => StatusCode::BAD_GATEWAY,
        LanternError::Cancelled => StatusCode::SERVICE_UNAVAILABLE,
        _ => {
            error!(target: "lantern::api", "Request failed: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };
    (status, e.to_string())
}

/// All `/api` routes.
pub fn api_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/health", get(health))
        // Model daemon
        .route("/ollama/ping", get(models::ping))
        .route("/ollama/models", get(models::list))
        // Chat
        .route("/chat", post(chat::send))
        .route("/sessions", get(sessions::list).post(sessions::create))
        .route("/sessions/{id}", get(sessions::get).delete(sessions::delete))
        .route("/sessions/{id}/title", put(sessions::update_title))
        // File index
        .route("/files/index", post(files::index))
        .route("/files", get(files::list).delete(files::delete))
        .route("/files/get", get(files::get))
        .route("/files/chunks", get(files::chunks))
        // Settings
        .route("/config", get(settings::list))
        .route(
            "/config/{key}",
            get(settings::get).put(settings::set).delete(settings::delete),
        )
}

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub database: DatabaseStats,
}

pub async fn health(State(state): State<Arc<AppState>>) -> Result<Json<HealthResponse>, ApiError> {
    let database = state.db.stats().map_err(api_error)?;
    Ok(Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        database,
    }))
}
