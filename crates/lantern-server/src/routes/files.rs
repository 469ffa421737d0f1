//! File index routes.

use super::{api_error, ApiError};
use crate::state::AppState;
use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use lantern_core::DEFAULT_FILE_LIST_LIMIT;
use lantern_types::{FileChunk, IndexedFile};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Deserialize)]
pub struct IndexFileRequest {
    pub path: PathBuf,
    /// Embedding model; the configured one when absent.
    #[serde(default)]
    pub model: Option<String>,
}

/// POST /api/files/index - Read, embed and store a file.
pub async fn index(
    State(state): State<Arc<AppState>>,
    Json(req): Json<IndexFileRequest>,
) -> Result<Json<IndexedFile>, ApiError> {
    if req.path.as_os_str().is_empty() {
        return Err((StatusCode::BAD_REQUEST, "path is required".to_string()));
    }
    let file = state
        .indexer
        .index_path(&req.path, req.model.as_deref())
        .await
        .map_err(api_error)?;
    Ok(Json(file))
}

#[derive(Deserialize)]
pub struct ListFilesQuery {
    #[serde(default = "default_limit")]
    pub limit: i64,
}

fn default_limit() -> i64 {
    DEFAULT_FILE_LIST_LIMIT
}

#[derive(Serialize)]
pub struct FileListResponse {
    pub files: Vec<IndexedFile>,
}

/// GET /api/files - Indexed files without their embeddings.
pub async fn list(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListFilesQuery>,
) -> Result<Json<FileListResponse>, ApiError> {
    let files = state.files.list_files(query.limit).map_err(api_error)?;
    Ok(Json(FileListResponse { files }))
}

#[derive(Deserialize)]
pub struct PathQuery {
    pub path: PathBuf,
}

/// GET /api/files/get?path= - One indexed file with its embedding.
pub async fn get(
    State(state): State<Arc<AppState>>,
    Query(query): Query<PathQuery>,
) -> Result<Json<IndexedFile>, ApiError> {
    let file = state.files.get_file(&query.path).map_err(api_error)?;
    Ok(Json(file))
}

/// DELETE /api/files?path= - Remove a file and its chunks from the index.
pub async fn delete(
    State(state): State<Arc<AppState>>,
    Query(query): Query<PathQuery>,
) -> Result<StatusCode, ApiError> {
    state.files.delete_file(&query.path).map_err(api_error)?;
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Deserialize)]
pub struct ChunksQuery {
    pub file_id: i64,
}

#[derive(Serialize)]
pub struct ChunkListResponse {
    pub chunks: Vec<FileChunk>,
}

/// GET /api/files/chunks?file_id=
pub async fn chunks(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ChunksQuery>,
) -> Result<Json<ChunkListResponse>, ApiError> {
    let chunks = state.files.get_chunks(query.file_id).map_err(api_error)?;
    Ok(Json(ChunkListResponse { chunks }))
}
