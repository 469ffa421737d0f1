//! Model daemon catalog types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A model installed on the inference daemon.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelInfo {
    pub name: String,
    /// Size on disk in bytes.
    #[serde(default)]
    pub size: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modified_at: Option<DateTime<Utc>>,
}
