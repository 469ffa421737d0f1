//! Runtime settings routes (`/api/config`).

use super::{api_error, ApiError};
use crate::state::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use lantern_types::Configuration;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

#[derive(Serialize)]
pub struct SettingsListResponse {
    pub configurations: Vec<Configuration>,
}

/// GET /api/config - All settings ordered by key.
pub async fn list(State(state): State<Arc<AppState>>) -> Result<Json<SettingsListResponse>, ApiError> {
    let configurations = state.settings.get_all().map_err(api_error)?;
    Ok(Json(SettingsListResponse { configurations }))
}

/// GET /api/config/{key}
pub async fn get(
    State(state): State<Arc<AppState>>,
    Path(key): Path<String>,
) -> Result<Json<Configuration>, ApiError> {
    let config = state.settings.get(&key).map_err(api_error)?;
    Ok(Json(config))
}

#[derive(Deserialize)]
pub struct SetSettingRequest {
    pub value: String,
    #[serde(default)]
    pub description: Option<String>,
}

/// PUT /api/config/{key} - Create or overwrite a setting.
pub async fn set(
    State(state): State<Arc<AppState>>,
    Path(key): Path<String>,
    Json(req): Json<SetSettingRequest>,
) -> Result<Json<Configuration>, ApiError> {
    state
        .settings
        .set(&key, &req.value, req.description.as_deref())
        .map_err(api_error)?;
    info!(target: "lantern::api", "Setting {} updated", key);
    let config = state.settings.get(&key).map_err(api_error)?;
    Ok(Json(config))
}

/// DELETE /api/config/{key}
pub async fn delete(
    State(state): State<Arc<AppState>>,
    Path(key): Path<String>,
) -> Result<StatusCode, ApiError> {
    state.settings.delete(&key).map_err(api_error)?;
    Ok(StatusCode::NO_CONTENT)
}
