//! Chat session and message types.
//!
//! A session is one conversation bound to a single inference model. Its
//! messages are append-only and always read back in the order they were
//! written.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Role of a message author.
///
/// Only `system`, `user` and `assistant` have meaning to the orchestrator.
/// Anything else is stored and replayed verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Role {
    /// Instructions seeded at the start of a conversation.
    System,
    /// Caller input.
    User,
    /// Model output.
    Assistant,
    /// Unrecognised role, kept as written.
    Other(String),
}

impl Role {
    pub fn as_str(&self) -> &str {
        match self {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
            Role::Other(s) => s,
        }
    }
}

impl From<String> for Role {
    fn from(s: String) -> Self {
        match s.as_str() {
            "system" => Role::System,
            "user" => Role::User,
            "assistant" => Role::Assistant,
            _ => Role::Other(s),
        }
    }
}

impl From<&str> for Role {
    fn from(s: &str) -> Self {
        Role::from(s.to_string())
    }
}

impl From<Role> for String {
    fn from(role: Role) -> Self {
        match role {
            Role::Other(s) => s,
            other => other.as_str().to_string(),
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A persisted conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatSession {
    /// Store-assigned row id.
    pub id: i64,
    /// Public identifier (UUID v4 string).
    pub session_id: String,
    /// Model this conversation is bound to.
    pub model: String,
    /// Empty titles are stored and reported as `None`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub created_at: DateTime<Utc>,
    /// Advances on every appended message and title change.
    pub updated_at: DateTime<Utc>,
}

/// A persisted message within a session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: i64,
    pub session_id: String,
    pub role: Role,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

/// A message as sent to the inference daemon.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PromptMessage {
    pub role: Role,
    pub content: String,
}

impl PromptMessage {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Role::System, content)
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }
}

impl From<ChatMessage> for PromptMessage {
    fn from(m: ChatMessage) -> Self {
        Self {
            role: m.role,
            content: m.content,
        }
    }
}

/// Reply produced by the inference daemon.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatReply {
    pub content: String,
    /// Model name as reported by the daemon.
    pub model: String,
}

/// One user turn submitted to the orchestrator.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChatRequest {
    pub message: String,
    /// Overrides the configured default model.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    /// Continue this session; a new one is created when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
}

/// Result of one orchestrated chat round-trip.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatTurn {
    pub session_id: String,
    /// Assistant reply text.
    pub message: String,
    pub model: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_role_round_trip_known_and_unknown() {
        for (raw, role) in [
            ("system", Role::System),
            ("user", Role::User),
            ("assistant", Role::Assistant),
            ("tool", Role::Other("tool".to_string())),
        ] {
            assert_eq!(Role::from(raw), role);
            assert_eq!(serde_json::to_value(&role).unwrap(), json!(raw));
            let back: Role = serde_json::from_value(json!(raw)).unwrap();
            assert_eq!(back, role);
        }
    }

    #[test]
    fn test_session_without_title_omits_field() {
        let session = ChatSession {
            id: 1,
            session_id: "abc".to_string(),
            model: "m1".to_string(),
            title: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        let value = serde_json::to_value(&session).unwrap();
        assert!(value.get("title").is_none());
        assert_eq!(value["model"], "m1");
    }

    #[test]
    fn test_prompt_message_from_chat_message() {
        let msg = ChatMessage {
            id: 7,
            session_id: "abc".to_string(),
            role: Role::Assistant,
            content: "hello".to_string(),
            created_at: Utc::now(),
        };
        let prompt = PromptMessage::from(msg);
        assert_eq!(prompt, PromptMessage::new(Role::Assistant, "hello"));
    }

    #[test]
    fn test_chat_request_optional_fields() {
        let req: ChatRequest = serde_json::from_value(json!({"message": "hi"})).unwrap();
        assert_eq!(req.message, "hi");
        assert_eq!(req.model, None);
        assert_eq!(req.session_id, None);
    }
}
