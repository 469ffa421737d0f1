//! SQLite persistence for chat sessions and their messages.
//!
//! Messages reference their session by public `session_id` and are removed
//! by the `ON DELETE CASCADE` foreign key when the session goes away.

use crate::db::{timestamp, Database};
use crate::{LanternError, Result};
use lantern_types::{ChatMessage, ChatSession, Role};
use rusqlite::{params, OptionalExtension};
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

/// Limit applied by [`ChatStore::list_sessions`] when the caller passes `<= 0`.
pub const DEFAULT_SESSION_LIST_LIMIT: i64 = 50;

/// SQLite-backed chat session store.
pub struct ChatStore {
    db: Arc<Database>,
}

impl ChatStore {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Create a session with a fresh UUID `session_id`.
    pub fn create_session(&self, model: &str, title: Option<&str>) -> Result<ChatSession> {
        let session_id = Uuid::new_v4().to_string();
        let title = title.filter(|t| !t.is_empty());

        let session = self.db.with_conn(|conn| {
            Ok(conn.query_row(
                r#"
                INSERT INTO chat_sessions (session_id, model, title)
                VALUES (?1, ?2, ?3)
                RETURNING id, session_id, model, title, created_at, updated_at
                "#,
                params![session_id, model, title],
                Self::row_to_session,
            )?)
        })?;

        debug!(target: "lantern::chat", "Created session {} (model {})", session.session_id, model);
        Ok(session)
    }

    /// Get a session by its public id.
    pub fn get_session(&self, session_id: &str) -> Result<ChatSession> {
        self.db
            .with_conn(|conn| {
                Ok(conn
                    .query_row(
                        r#"
                        SELECT id, session_id, model, title, created_at, updated_at
                        FROM chat_sessions
                        WHERE session_id = ?1
                        "#,
                        params![session_id],
                        Self::row_to_session,
                    )
                    .optional()?)
            })?
            .ok_or_else(|| LanternError::not_found("chat session", session_id))
    }

    /// List sessions, most recently active first.
    pub fn list_sessions(&self, limit: i64) -> Result<Vec<ChatSession>> {
        let limit = if limit <= 0 {
            DEFAULT_SESSION_LIST_LIMIT
        } else {
            limit
        };

        self.db.with_conn(|conn| {
            let mut stmt = conn.prepare(
                r#"
                SELECT id, session_id, model, title, created_at, updated_at
                FROM chat_sessions
                ORDER BY updated_at DESC, id DESC
                LIMIT ?1
                "#,
            )?;
            let sessions = stmt
                .query_map(params![limit], Self::row_to_session)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(sessions)
        })
    }

    /// Delete a session and, through the cascade, all of its messages.
    pub fn delete_session(&self, session_id: &str) -> Result<()> {
        let affected = self.db.with_conn(|conn| {
            Ok(conn.execute(
                "DELETE FROM chat_sessions WHERE session_id = ?1",
                params![session_id],
            )?)
        })?;
        if affected == 0 {
            return Err(LanternError::not_found("chat session", session_id));
        }
        debug!(target: "lantern::chat", "Deleted session {}", session_id);
        Ok(())
    }

    /// Append a message and bump the parent session's `updated_at`.
    ///
    /// The two writes are not atomic. If the touch fails the error is
    /// returned but the message stays.
    pub fn add_message(&self, session_id: &str, role: &Role, content: &str) -> Result<ChatMessage> {
        self.db.with_conn(|conn| {
            let message = conn.query_row(
                r#"
                INSERT INTO chat_messages (session_id, role, content)
                VALUES (?1, ?2, ?3)
                RETURNING id, session_id, role, content, created_at
                "#,
                params![session_id, role.as_str(), content],
                Self::row_to_message,
            )?;

            conn.execute(
                "UPDATE chat_sessions SET updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now') WHERE session_id = ?1",
                params![session_id],
            )?;

            Ok(message)
        })
    }

    /// Messages of a session in write order.
    ///
    /// An unknown session yields an empty list, not an error.
    pub fn get_messages(&self, session_id: &str) -> Result<Vec<ChatMessage>> {
        self.db.with_conn(|conn| {
            let mut stmt = conn.prepare(
                r#"
                SELECT id, session_id, role, content, created_at
                FROM chat_messages
                WHERE session_id = ?1
                ORDER BY created_at ASC, id ASC
                "#,
            )?;
            let messages = stmt
                .query_map(params![session_id], Self::row_to_message)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(messages)
        })
    }

    pub fn count_messages(&self, session_id: &str) -> Result<i64> {
        self.db.with_conn(|conn| {
            Ok(conn.query_row(
                "SELECT COUNT(*) FROM chat_messages WHERE session_id = ?1",
                params![session_id],
                |row| row.get(0),
            )?)
        })
    }

    /// Rename a session. An empty title clears it.
    pub fn update_session_title(&self, session_id: &str, title: &str) -> Result<()> {
        let title = Some(title).filter(|t| !t.is_empty());
        let affected = self.db.with_conn(|conn| {
            Ok(conn.execute(
                r#"
                UPDATE chat_sessions
                SET title = ?1, updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
                WHERE session_id = ?2
                "#,
                params![title, session_id],
            )?)
        })?;
        if affected == 0 {
            return Err(LanternError::not_found("chat session", session_id));
        }
        Ok(())
    }

    fn row_to_session(row: &rusqlite::Row) -> rusqlite::Result<ChatSession> {
        let title: Option<String> = row.get("title")?;
        Ok(ChatSession {
            id: row.get("id")?,
            session_id: row.get("session_id")?,
            model: row.get("model")?,
            title: title.filter(|t| !t.is_empty()),
            created_at: timestamp(row, "created_at")?,
            updated_at: timestamp(row, "updated_at")?,
        })
    }

    fn row_to_message(row: &rusqlite::Row) -> rusqlite::Result<ChatMessage> {
        let role: String = row.get("role")?;
        Ok(ChatMessage {
            id: row.get("id")?,
            session_id: row.get("session_id")?,
            role: Role::from(role),
            content: row.get("content")?,
            created_at: timestamp(row, "created_at")?,
        })
    }
}
