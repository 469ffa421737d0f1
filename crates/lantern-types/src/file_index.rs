//! Indexed file and chunk types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A file snapshot with its embedding, keyed by path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexedFile {
    pub id: i64,
    pub file_path: String,
    /// Full text at index time.
    pub content: String,
    /// `None` until an embedding has been computed. Listings never carry it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub embedding: Option<Vec<f32>>,
    /// Embedding model name.
    pub model: String,
    /// File size in bytes, from filesystem metadata.
    pub file_size: u64,
    /// Hex SHA-256 of the file bytes at index time.
    pub file_hash: String,
    pub indexed_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// One ordered piece of an indexed file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileChunk {
    pub id: i64,
    pub file_id: i64,
    /// Zero-based position within the file. Not unique.
    pub chunk_index: i64,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub embedding: Option<Vec<f32>>,
    pub created_at: DateTime<Utc>,
}
