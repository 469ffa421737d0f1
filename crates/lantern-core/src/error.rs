//! Error types for Lantern.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LanternError {
    #[error("{kind} not found: {key}")]
    NotFound { kind: &'static str, key: String },

    #[error("Failed to open database at {}: {source}", path.display())]
    OpenFailed {
        path: PathBuf,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("Serialization failed: {0}")]
    SerializationFailed(String),

    #[error("Upstream request failed: {0}")]
    UpstreamFailed(String),

    #[error("Request cancelled")]
    Cancelled,

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Database connection is closed")]
    ConnectionClosed,

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl LanternError {
    pub(crate) fn not_found(kind: &'static str, key: impl Into<String>) -> Self {
        Self::NotFound {
            kind,
            key: key.into(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// True for unique-key and foreign-key violations reported by SQLite.
    pub fn is_constraint_violation(&self) -> bool {
        matches!(
            self,
            Self::Database(rusqlite::Error::SqliteFailure(e, _))
                if e.code == rusqlite::ErrorCode::ConstraintViolation
        )
    }
}

impl From<reqwest::Error> for LanternError {
    fn from(e: reqwest::Error) -> Self {
        Self::UpstreamFailed(e.to_string())
    }
}
