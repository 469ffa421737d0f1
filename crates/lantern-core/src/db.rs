//! SQLite connection manager.
//!
//! One [`Database`] owns exactly one physical connection. Every store borrows
//! it through [`Database::with_conn`], which holds the connection mutex for
//! the duration of a single closure, so all reads and writes across all
//! stores are serialized through one lock.

use crate::{LanternError, Result};
use chrono::{DateTime, Utc};
use rusqlite::Connection;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tracing::{debug, info};

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Full schema. Every statement is safe to re-run against an initialized file.
const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS configurations (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    key TEXT NOT NULL UNIQUE,
    value TEXT NOT NULL,
    description TEXT,
    created_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now')),
    updated_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now'))
);

CREATE TABLE IF NOT EXISTS chat_sessions (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    session_id TEXT NOT NULL UNIQUE,
    model TEXT NOT NULL,
    title TEXT,
    created_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now')),
    updated_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now'))
);

CREATE TABLE IF NOT EXISTS chat_messages (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    session_id TEXT NOT NULL,
    role TEXT NOT NULL,
    content TEXT NOT NULL,
    created_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now')),
    FOREIGN KEY (session_id) REFERENCES chat_sessions(session_id) ON DELETE CASCADE
);

CREATE TABLE IF NOT EXISTS indexed_files (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    file_path TEXT NOT NULL UNIQUE,
    content TEXT NOT NULL,
    embedding BLOB,
    model TEXT NOT NULL,
    file_size INTEGER NOT NULL DEFAULT 0,
    file_hash TEXT NOT NULL DEFAULT '',
    indexed_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now')),
    updated_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now'))
);

CREATE TABLE IF NOT EXISTS file_chunks (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    file_id INTEGER NOT NULL,
    chunk_index INTEGER NOT NULL,
    content TEXT NOT NULL,
    embedding BLOB,
    created_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now')),
    FOREIGN KEY (file_id) REFERENCES indexed_files(id) ON DELETE CASCADE
);

CREATE INDEX IF NOT EXISTS idx_chat_sessions_updated_at ON chat_sessions(updated_at);
CREATE INDEX IF NOT EXISTS idx_chat_messages_session_id ON chat_messages(session_id);
CREATE INDEX IF NOT EXISTS idx_indexed_files_updated_at ON indexed_files(updated_at);
CREATE INDEX IF NOT EXISTS idx_indexed_files_hash ON indexed_files(file_hash);
CREATE INDEX IF NOT EXISTS idx_file_chunks_file_id ON file_chunks(file_id, chunk_index);

-- Refresh updated_at on any update that did not set it itself.
CREATE TRIGGER IF NOT EXISTS update_configurations_timestamp
AFTER UPDATE ON configurations
FOR EACH ROW WHEN NEW.updated_at IS OLD.updated_at
BEGIN
    UPDATE configurations SET updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now') WHERE id = OLD.id;
END;

CREATE TRIGGER IF NOT EXISTS update_chat_sessions_timestamp
AFTER UPDATE ON chat_sessions
FOR EACH ROW WHEN NEW.updated_at IS OLD.updated_at
BEGIN
    UPDATE chat_sessions SET updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now') WHERE id = OLD.id;
END;

CREATE TRIGGER IF NOT EXISTS update_indexed_files_timestamp
AFTER UPDATE ON indexed_files
FOR EACH ROW WHEN NEW.updated_at IS OLD.updated_at
BEGIN
    UPDATE indexed_files SET updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now') WHERE id = OLD.id;
END;
"#;

/// Row counts per table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DatabaseStats {
    pub configurations: i64,
    pub chat_sessions: i64,
    pub chat_messages: i64,
    pub indexed_files: i64,
    pub file_chunks: i64,
}

/// Owner of the single shared SQLite connection.
pub struct Database {
    path: Option<PathBuf>,
    conn: Mutex<Option<Connection>>,
}

impl Database {
    /// Open or create the database at the given path and apply the schema.
    pub fn open(path: &Path) -> Result<Self> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            create_db_dir(parent).map_err(|e| LanternError::OpenFailed {
                path: path.to_path_buf(),
                source: Box::new(e),
            })?;
        }

        let conn = Connection::open(path).map_err(|e| LanternError::OpenFailed {
            path: path.to_path_buf(),
            source: Box::new(e),
        })?;

        // A file that is not a SQLite database only fails here.
        let db = Self::init(conn, Some(path.to_path_buf())).map_err(|e| LanternError::OpenFailed {
            path: path.to_path_buf(),
            source: Box::new(e),
        })?;
        info!(target: "lantern::db", "Database initialized at {}", path.display());
        Ok(db)
    }

    /// Open a private in-memory database. Used by tests.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Self::init(conn, None)
    }

    fn init(conn: Connection, path: Option<PathBuf>) -> Result<Self> {
        conn.busy_timeout(BUSY_TIMEOUT)?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            path,
            conn: Mutex::new(Some(conn)),
        })
    }

    /// File path, or `None` for in-memory databases.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    fn lock(&self) -> MutexGuard<'_, Option<Connection>> {
        self.conn.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Run `f` with exclusive access to the connection.
    ///
    /// The lock is released when `f` returns. Never call this from inside
    /// another `with_conn` closure.
    pub(crate) fn with_conn<T>(&self, f: impl FnOnce(&Connection) -> Result<T>) -> Result<T> {
        let guard = self.lock();
        let conn = guard.as_ref().ok_or(LanternError::ConnectionClosed)?;
        f(conn)
    }

    /// Close the connection. Closing an already closed database is a no-op.
    pub fn close(&self) -> Result<()> {
        let taken = self.lock().take();
        if let Some(conn) = taken {
            conn.close().map_err(|(_, e)| LanternError::Database(e))?;
            debug!(target: "lantern::db", "Database connection closed");
        }
        Ok(())
    }

    pub fn is_closed(&self) -> bool {
        self.lock().is_none()
    }

    /// Count rows in every table.
    pub fn stats(&self) -> Result<DatabaseStats> {
        self.with_conn(|conn| {
            let count = |table: &str| -> rusqlite::Result<i64> {
                conn.query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |row| {
                    row.get(0)
                })
            };
            Ok(DatabaseStats {
                configurations: count("configurations")?,
                chat_sessions: count("chat_sessions")?,
                chat_messages: count("chat_messages")?,
                indexed_files: count("indexed_files")?,
                file_chunks: count("file_chunks")?,
            })
        })
    }
}

impl Drop for Database {
    fn drop(&mut self) {
        let _ = self.close();
    }
}

fn create_db_dir(dir: &Path) -> std::io::Result<()> {
    let mut builder = std::fs::DirBuilder::new();
    builder.recursive(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::DirBuilderExt;
        builder.mode(0o755);
    }
    builder.create(dir)
}

/// Read an RFC 3339 timestamp column written by SQLite's `strftime`.
pub(crate) fn timestamp(row: &rusqlite::Row, idx: &str) -> rusqlite::Result<DateTime<Utc>> {
    let raw: String = row.get(idx)?;
    DateTime::parse_from_rfc3339(&raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(
                0,
                rusqlite::types::Type::Text,
                Box::new(e),
            )
        })
}
