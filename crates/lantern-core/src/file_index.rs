//! SQLite persistence for indexed file contents, chunks and embeddings.
//!
//! A file is identified by its path. Re-indexing a path updates the row in
//! place. Chunks are managed separately and are only removed when their file
//! is deleted.

use crate::db::{timestamp, Database};
use crate::embedding;
use crate::{LanternError, Result};
use lantern_types::{FileChunk, IndexedFile};
use rusqlite::{params, OptionalExtension};
use sha2::{Digest, Sha256};
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

/// Limit applied by [`FileIndexStore::list_files`] when the caller passes `<= 0`.
pub const DEFAULT_FILE_LIST_LIMIT: i64 = 100;

/// Hex SHA-256 of a file's full contents.
pub fn hash_file(path: &Path) -> Result<String> {
    let mut file = std::fs::File::open(path)?;
    let mut hasher = Sha256::new();
    std::io::copy(&mut file, &mut hasher)?;
    Ok(format!("{:x}", hasher.finalize()))
}

/// SQLite-backed file index.
pub struct FileIndexStore {
    db: Arc<Database>,
}

impl FileIndexStore {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Insert or update the index entry for `path`.
    ///
    /// Size and hash come from the file on disk, not from `content`, which
    /// may have been pre-processed by the caller. On update the original `id`
    /// and `indexed_at` are kept.
    pub fn index_file(
        &self,
        path: &Path,
        content: &str,
        model: &str,
        embedding: Option<&[f32]>,
    ) -> Result<IndexedFile> {
        let file_size = std::fs::metadata(path)?.len();
        let file_hash = hash_file(path)?;
        let file_path = path.to_string_lossy().into_owned();
        let blob = embedding::encode_optional(embedding);

        let (id, indexed_at, updated_at) = self.db.with_conn(|conn| {
            Ok(conn.query_row(
                r#"
                INSERT INTO indexed_files (file_path, content, embedding, model, file_size, file_hash)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                ON CONFLICT(file_path) DO UPDATE SET
                    content = excluded.content,
                    embedding = excluded.embedding,
                    model = excluded.model,
                    file_size = excluded.file_size,
                    file_hash = excluded.file_hash,
                    updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
                RETURNING id, indexed_at, updated_at
                "#,
                params![file_path, content, blob, model, file_size as i64, file_hash],
                |row| {
                    Ok((
                        row.get::<_, i64>("id")?,
                        timestamp(row, "indexed_at")?,
                        timestamp(row, "updated_at")?,
                    ))
                },
            )?)
        })?;

        debug!(target: "lantern::files", "Indexed {} ({} bytes, id {})", file_path, file_size, id);

        Ok(IndexedFile {
            id,
            file_path,
            content: content.to_string(),
            embedding: embedding.map(<[f32]>::to_vec),
            model: model.to_string(),
            file_size,
            file_hash,
            indexed_at,
            updated_at,
        })
    }

    /// Get the index entry for `path`, embedding included.
    pub fn get_file(&self, path: &Path) -> Result<IndexedFile> {
        let file_path = path.to_string_lossy();
        let row = self.db.with_conn(|conn| {
            Ok(conn
                .query_row(
                    r#"
                    SELECT id, file_path, content, embedding, model, file_size, file_hash,
                           indexed_at, updated_at
                    FROM indexed_files
                    WHERE file_path = ?1
                    "#,
                    params![file_path],
                    |row| {
                        let blob: Option<Vec<u8>> = row.get("embedding")?;
                        Ok((Self::row_to_file(row)?, blob))
                    },
                )
                .optional()?)
        })?;

        let (mut file, blob) = row.ok_or_else(|| LanternError::not_found("indexed file", file_path))?;
        file.embedding = embedding::decode_optional(blob)?;
        Ok(file)
    }

    /// List indexed files, most recently updated first. Embeddings are not loaded.
    pub fn list_files(&self, limit: i64) -> Result<Vec<IndexedFile>> {
        let limit = if limit <= 0 {
            DEFAULT_FILE_LIST_LIMIT
        } else {
            limit
        };

        self.db.with_conn(|conn| {
            let mut stmt = conn.prepare(
                r#"
                SELECT id, file_path, content, model, file_size, file_hash, indexed_at, updated_at
                FROM indexed_files
                ORDER BY updated_at DESC, id DESC
                LIMIT ?1
                "#,
            )?;
            let files = stmt
                .query_map(params![limit], Self::row_to_file)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(files)
        })
    }

    /// Delete the entry for `path` and, through the cascade, its chunks.
    pub fn delete_file(&self, path: &Path) -> Result<()> {
        let file_path = path.to_string_lossy();
        let affected = self.db.with_conn(|conn| {
            Ok(conn.execute(
                "DELETE FROM indexed_files WHERE file_path = ?1",
                params![file_path],
            )?)
        })?;
        if affected == 0 {
            return Err(LanternError::not_found("indexed file", file_path));
        }
        debug!(target: "lantern::files", "Removed {} from index", file_path);
        Ok(())
    }

    /// True when the file on disk no longer matches the indexed hash.
    pub fn is_stale(&self, path: &Path) -> Result<bool> {
        let file_path = path.to_string_lossy();
        let stored: String = self
            .db
            .with_conn(|conn| {
                Ok(conn
                    .query_row(
                        "SELECT file_hash FROM indexed_files WHERE file_path = ?1",
                        params![file_path],
                        |row| row.get(0),
                    )
                    .optional()?)
            })?
            .ok_or_else(|| LanternError::not_found("indexed file", file_path))?;

        Ok(hash_file(path)? != stored)
    }

    /// Append a chunk. Duplicate `chunk_index` values are allowed.
    pub fn add_chunk(
        &self,
        file_id: i64,
        chunk_index: i64,
        content: &str,
        embedding: Option<&[f32]>,
    ) -> Result<FileChunk> {
        let blob = embedding::encode_optional(embedding);
        let (id, created_at) = self.db.with_conn(|conn| {
            Ok(conn.query_row(
                r#"
                INSERT INTO file_chunks (file_id, chunk_index, content, embedding)
                VALUES (?1, ?2, ?3, ?4)
                RETURNING id, created_at
                "#,
                params![file_id, chunk_index, content, blob],
                |row| Ok((row.get::<_, i64>("id")?, timestamp(row, "created_at")?)),
            )?)
        })?;

        Ok(FileChunk {
            id,
            file_id,
            chunk_index,
            content: content.to_string(),
            embedding: embedding.map(<[f32]>::to_vec),
            created_at,
        })
    }

    /// Chunks of a file ordered by `chunk_index`, ties in insertion order.
    pub fn get_chunks(&self, file_id: i64) -> Result<Vec<FileChunk>> {
        let rows = self.db.with_conn(|conn| {
            let mut stmt = conn.prepare(
                r#"
                SELECT id, file_id, chunk_index, content, embedding, created_at
                FROM file_chunks
                WHERE file_id = ?1
                ORDER BY chunk_index ASC, id ASC
                "#,
            )?;
            let rows = stmt
                .query_map(params![file_id], |row| {
                    let chunk = FileChunk {
                        id: row.get("id")?,
                        file_id: row.get("file_id")?,
                        chunk_index: row.get("chunk_index")?,
                        content: row.get("content")?,
                        embedding: None,
                        created_at: timestamp(row, "created_at")?,
                    };
                    let blob: Option<Vec<u8>> = row.get("embedding")?;
                    Ok((chunk, blob))
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })?;

        rows.into_iter()
            .map(|(mut chunk, blob)| {
                chunk.embedding = embedding::decode_optional(blob)?;
                Ok(chunk)
            })
            .collect()
    }

    fn row_to_file(row: &rusqlite::Row) -> rusqlite::Result<IndexedFile> {
        let file_size: i64 = row.get("file_size")?;
        Ok(IndexedFile {
            id: row.get("id")?,
            file_path: row.get("file_path")?,
            content: row.get("content")?,
            embedding: None,
            model: row.get("model")?,
            file_size: file_size as u64,
            file_hash: row.get("file_hash")?,
            indexed_at: timestamp(row, "indexed_at")?,
            updated_at: timestamp(row, "updated_at")?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn create_test_store() -> (FileIndexStore, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let db = Database::open(&temp_dir.path().join("ai.db")).unwrap();
        (FileIndexStore::new(Arc::new(db)), temp_dir)
    }

    fn write_file(dir: &TempDir, name: &str, content: &str) -> std::path::PathBuf {
        let path = dir.path().join(name);
        std::fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_index_then_get() {
        let (store, dir) = create_test_store();
        let path = write_file(&dir, "a.txt", "abc");

        store
            .index_file(&path, "abc", "modelX", Some(&[0.1, 0.2]))
            .unwrap();

        let file = store.get_file(&path).unwrap();
        assert_eq!(file.content, "abc");
        assert_eq!(file.embedding, Some(vec![0.1, 0.2]));
        assert_eq!(file.model, "modelX");
        assert_eq!(file.file_size, 3);
        assert_eq!(
            file.file_hash,
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_reindex_keeps_identity() {
        let (store, dir) = create_test_store();
        let path = write_file(&dir, "a.txt", "abc");

        let first = store.index_file(&path, "abc", "m", Some(&[1.0])).unwrap();
        let second = store.index_file(&path, "abc", "m", Some(&[1.0])).unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(first.indexed_at, second.indexed_at);
        assert_eq!(first.file_hash, second.file_hash);
        assert!(second.updated_at >= first.updated_at);
        assert_eq!(store.list_files(0).unwrap().len(), 1);
    }

    #[test]
    fn test_reindex_overwrites_fields() {
        let (store, dir) = create_test_store();
        let path = write_file(&dir, "a.txt", "abc");
        let first = store.index_file(&path, "abc", "m1", Some(&[1.0])).unwrap();

        std::fs::write(&path, "changed content").unwrap();
        let second = store
            .index_file(&path, "changed content", "m2", None)
            .unwrap();

        assert_eq!(second.id, first.id);
        let file = store.get_file(&path).unwrap();
        assert_eq!(file.content, "changed content");
        assert_eq!(file.model, "m2");
        assert_eq!(file.embedding, None);
        assert_eq!(file.file_size, 15);
        assert_ne!(file.file_hash, first.file_hash);
    }

    #[test]
    fn test_size_and_hash_come_from_disk() {
        let (store, dir) = create_test_store();
        let path = write_file(&dir, "raw.txt", "raw bytes on disk");

        let file = store.index_file(&path, "cleaned", "m", None).unwrap();
        assert_eq!(file.content, "cleaned");
        assert_eq!(file.file_size, 17);
        assert_eq!(file.file_hash, hash_file(&path).unwrap());
    }

    #[test]
    fn test_index_missing_file_fails() {
        let (store, dir) = create_test_store();
        let err = store
            .index_file(&dir.path().join("missing.txt"), "x", "m", None)
            .unwrap_err();
        assert!(matches!(err, LanternError::Io(_)));
        assert!(store.list_files(0).unwrap().is_empty());
    }

    #[test]
    fn test_empty_embedding_is_kept() {
        let (store, dir) = create_test_store();
        let path = write_file(&dir, "a.txt", "abc");
        store.index_file(&path, "abc", "m", Some(&[])).unwrap();
        assert_eq!(store.get_file(&path).unwrap().embedding, Some(vec![]));
    }

    #[test]
    fn test_zero_length_blob_means_absent() {
        let (store, dir) = create_test_store();
        let path = write_file(&dir, "a.txt", "abc");
        store.index_file(&path, "abc", "m", Some(&[1.0])).unwrap();
        store
            .db
            .with_conn(|conn| {
                conn.execute("UPDATE indexed_files SET embedding = x''", [])?;
                Ok(())
            })
            .unwrap();

        assert_eq!(store.get_file(&path).unwrap().embedding, None);
    }

    #[test]
    fn test_corrupt_embedding_is_an_error() {
        let (store, dir) = create_test_store();
        let path = write_file(&dir, "a.txt", "abc");
        store.index_file(&path, "abc", "m", Some(&[1.0])).unwrap();
        store
            .db
            .with_conn(|conn| {
                conn.execute("UPDATE indexed_files SET embedding = x'0500'", [])?;
                Ok(())
            })
            .unwrap();

        let err = store.get_file(&path).unwrap_err();
        assert!(matches!(err, LanternError::SerializationFailed(_)));
    }

    #[test]
    fn test_list_files_omits_embeddings() {
        let (store, dir) = create_test_store();
        for name in ["a.txt", "b.txt", "c.txt"] {
            let path = write_file(&dir, name, name);
            store.index_file(&path, name, "m", Some(&[0.5])).unwrap();
        }

        let files = store.list_files(2).unwrap();
        assert_eq!(files.len(), 2);
        assert!(files.iter().all(|f| f.embedding.is_none()));
        assert_eq!(store.list_files(-1).unwrap().len(), 3);
    }

    #[test]
    fn test_delete_unknown_file() {
        let (store, _dir) = create_test_store();
        let err = store.delete_file(Path::new("/tmp/never-indexed.txt")).unwrap_err();
        assert!(err.is_not_found());
        assert!(store
            .get_file(Path::new("/tmp/never-indexed.txt"))
            .unwrap_err()
            .is_not_found());
    }

    #[test]
    fn test_chunks_ordered_and_cascaded() {
        let (store, dir) = create_test_store();
        let path = write_file(&dir, "a.txt", "abc");
        let file = store.index_file(&path, "abc", "m", None).unwrap();

        store.add_chunk(file.id, 2, "third", None).unwrap();
        store.add_chunk(file.id, 0, "first", Some(&[1.0, 2.0])).unwrap();
        store.add_chunk(file.id, 1, "second-a", None).unwrap();
        store.add_chunk(file.id, 1, "second-b", Some(&[])).unwrap();

        let chunks = store.get_chunks(file.id).unwrap();
        let contents: Vec<&str> = chunks.iter().map(|c| c.content.as_str()).collect();
        assert_eq!(contents, vec!["first", "second-a", "second-b", "third"]);
        assert_eq!(chunks[0].embedding, Some(vec![1.0, 2.0]));
        assert_eq!(chunks[1].embedding, None);
        assert_eq!(chunks[2].embedding, Some(vec![]));

        // Re-indexing leaves chunks alone.
        store.index_file(&path, "abc", "m", None).unwrap();
        assert_eq!(store.get_chunks(file.id).unwrap().len(), 4);

        store.delete_file(&path).unwrap();
        assert!(store.get_chunks(file.id).unwrap().is_empty());
    }

    #[test]
    fn test_chunk_requires_file() {
        let (store, _dir) = create_test_store();
        let err = store.add_chunk(999, 0, "orphan", None).unwrap_err();
        assert!(err.is_constraint_violation());
    }

    #[test]
    fn test_staleness_detection() {
        let (store, dir) = create_test_store();
        let path = write_file(&dir, "a.txt", "abc");
        store.index_file(&path, "abc", "m", None).unwrap();
        assert!(!store.is_stale(&path).unwrap());

        std::fs::write(&path, "abcd").unwrap();
        assert!(store.is_stale(&path).unwrap());

        let other = write_file(&dir, "b.txt", "b");
        assert!(store.is_stale(&other).unwrap_err().is_not_found());
    }
}
