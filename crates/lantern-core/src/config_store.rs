//! Key/value runtime settings.

use crate::db::{timestamp, Database};
use crate::{LanternError, Result};
use lantern_types::Configuration;
use rusqlite::{params, OptionalExtension};
use std::sync::Arc;

const SELECT_COLUMNS: &str = "SELECT id, key, value, description, created_at, updated_at FROM configurations";

/// SQLite-backed settings store.
pub struct ConfigStore {
    db: Arc<Database>,
}

impl ConfigStore {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Create or overwrite a setting. Refreshes `updated_at` on overwrite.
    pub fn set(&self, key: &str, value: &str, description: Option<&str>) -> Result<()> {
        if key.is_empty() {
            return Err(LanternError::InvalidRequest(
                "configuration key must not be empty".to_string(),
            ));
        }
        self.db.with_conn(|conn| {
            conn.execute(
                r#"
                INSERT INTO configurations (key, value, description)
                VALUES (?1, ?2, ?3)
                ON CONFLICT(key) DO UPDATE SET
                    value = excluded.value,
                    description = excluded.description,
                    updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
                "#,
                params![key, value, description],
            )?;
            Ok(())
        })
    }

    /// Get a setting by key.
    pub fn get(&self, key: &str) -> Result<Configuration> {
        self.db
            .with_conn(|conn| {
                Ok(conn
                    .query_row(
                        &format!("{SELECT_COLUMNS} WHERE key = ?1"),
                        params![key],
                        Self::row_to_configuration,
                    )
                    .optional()?)
            })?
            .ok_or_else(|| LanternError::not_found("configuration", key))
    }

    /// Value of a setting, or `None` when it does not exist.
    pub fn get_value(&self, key: &str) -> Result<Option<String>> {
        match self.get(key) {
            Ok(config) => Ok(Some(config.value)),
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// All settings ordered by key.
    pub fn get_all(&self) -> Result<Vec<Configuration>> {
        self.db.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!("{SELECT_COLUMNS} ORDER BY key ASC"))?;
            let configs = stmt
                .query_map([], Self::row_to_configuration)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(configs)
        })
    }

    /// Delete a setting.
    pub fn delete(&self, key: &str) -> Result<()> {
        let affected = self.db.with_conn(|conn| {
            Ok(conn.execute("DELETE FROM configurations WHERE key = ?1", params![key])?)
        })?;
        if affected == 0 {
            return Err(LanternError::not_found("configuration", key));
        }
        Ok(())
    }

    pub fn exists(&self, key: &str) -> Result<bool> {
        self.db.with_conn(|conn| {
            Ok(conn.query_row(
                "SELECT COUNT(*) > 0 FROM configurations WHERE key = ?1",
                params![key],
                |row| row.get(0),
            )?)
        })
    }

    fn row_to_configuration(row: &rusqlite::Row) -> rusqlite::Result<Configuration> {
        Ok(Configuration {
            id: row.get("id")?,
            key: row.get("key")?,
            value: row.get("value")?,
            description: row.get("description")?,
            created_at: timestamp(row, "created_at")?,
            updated_at: timestamp(row, "updated_at")?,
        })
    }
}
