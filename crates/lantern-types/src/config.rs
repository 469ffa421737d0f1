//! Runtime configuration entries.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Well-known configuration keys read by the chat orchestrator.
pub mod keys {
    /// Model used when a chat request does not name one.
    pub const DEFAULT_MODEL: &str = "ollama.default_model";
    /// System prompt seeded into every new conversation.
    pub const SYSTEM_PROMPT: &str = "ollama.system_prompt";
}

/// A persisted key/value setting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Configuration {
    pub id: i64,
    pub key: String,
    pub value: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
