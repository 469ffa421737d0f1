//! Model daemon routes.

use super::{api_error, ApiError};
use crate::state::AppState;
use axum::{extract::State, http::StatusCode, Json};
use lantern_core::LanternError;
use lantern_types::ModelInfo;
use serde::Serialize;
use std::sync::Arc;

#[derive(Serialize)]
pub struct PingResponse {
    pub status: &'static str,
    pub url: String,
}

/// GET /api/ollama/ping - 200 when the daemon answers, 503 when it does not.
pub async fn ping(State(state): State<Arc<AppState>>) -> Result<Json<PingResponse>, ApiError> {
    state.models.ping().await.map_err(|e| match e {
        LanternError::UpstreamFailed(reason) => (
            StatusCode::SERVICE_UNAVAILABLE,
            format!("Ollama is not accessible: {reason}"),
        ),
        other => api_error(other),
    })?;
    Ok(Json(PingResponse {
        status: "ok",
        url: state.config.ollama_url.clone(),
    }))
}

#[derive(Serialize)]
pub struct ModelListResponse {
    pub models: Vec<ModelInfo>,
}

/// GET /api/ollama/models - Models installed on the daemon.
pub async fn list(State(state): State<Arc<AppState>>) -> Result<Json<ModelListResponse>, ApiError> {
    let models = state.models.list_models().await.map_err(api_error)?;
    Ok(Json(ModelListResponse { models }))
}
