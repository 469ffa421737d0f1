//! Read a file, embed it, and store it in the index.

use crate::file_index::FileIndexStore;
use crate::ollama::EmbeddingProvider;
use crate::Result;
use lantern_types::IndexedFile;
use std::path::Path;
use std::sync::Arc;
use tracing::info;

pub const DEFAULT_EMBEDDING_MODEL: &str = "nomic-embed-text";

pub struct FileIndexer {
    store: Arc<FileIndexStore>,
    embedder: Arc<dyn EmbeddingProvider>,
    default_model: String,
}

impl FileIndexer {
    pub fn new(
        store: Arc<FileIndexStore>,
        embedder: Arc<dyn EmbeddingProvider>,
        default_model: impl Into<String>,
    ) -> Self {
        Self {
            store,
            embedder,
            default_model: default_model.into(),
        }
    }

    /// Index the file at `path` with an embedding of its whole content.
    ///
    /// Invalid UTF-8 is replaced rather than rejected.
    pub async fn index_path(&self, path: &Path, model: Option<&str>) -> Result<IndexedFile> {
        let model = model
            .filter(|m| !m.is_empty())
            .unwrap_or(self.default_model.as_str());

        let bytes = tokio::fs::read(path).await?;
        let content = String::from_utf8_lossy(&bytes);
        let embedding = self.embedder.embed(model, &content).await?;

        let file = self
            .store
            .index_file(path, &content, model, Some(&embedding))?;
        info!(
            target: "lantern::files",
            "Indexed {} with {} ({} dimensions)",
            file.file_path,
            model,
            embedding.len()
        );
        Ok(file)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;
    use crate::LanternError;
    use async_trait::async_trait;
    use std::sync::Mutex;
    use tempfile::TempDir;

    #[derive(Default)]
    struct RecordingEmbedder {
        calls: Mutex<Vec<(String, String)>>,
        fail: bool,
    }

    #[async_trait]
    impl EmbeddingProvider for RecordingEmbedder {
        async fn embed(&self, model: &str, text: &str) -> Result<Vec<f32>> {
            self.calls
                .lock()
                .unwrap()
                .push((model.to_string(), text.to_string()));
            if self.fail {
                return Err(LanternError::UpstreamFailed("daemon down".to_string()));
            }
            Ok(vec![text.len() as f32, 1.0])
        }
    }

    fn setup(embedder: Arc<RecordingEmbedder>) -> (FileIndexer, Arc<FileIndexStore>, TempDir) {
        let dir = TempDir::new().unwrap();
        let db = Arc::new(Database::open_in_memory().unwrap());
        let store = Arc::new(FileIndexStore::new(db));
        let indexer = FileIndexer::new(store.clone(), embedder, DEFAULT_EMBEDDING_MODEL);
        (indexer, store, dir)
    }

    #[tokio::test]
    async fn test_index_path_uses_default_model() {
        let embedder = Arc::new(RecordingEmbedder::default());
        let (indexer, store, dir) = setup(embedder.clone());
        let path = dir.path().join("notes.md");
        std::fs::write(&path, "# notes").unwrap();

        let file = indexer.index_path(&path, None).await.unwrap();
        assert_eq!(file.model, DEFAULT_EMBEDDING_MODEL);
        assert_eq!(file.embedding, Some(vec![7.0, 1.0]));

        let stored = store.get_file(&path).unwrap();
        assert_eq!(stored.content, "# notes");
        assert_eq!(
            embedder.calls.lock().unwrap().as_slice(),
            &[(DEFAULT_EMBEDDING_MODEL.to_string(), "# notes".to_string())]
        );
    }

    #[tokio::test]
    async fn test_index_path_with_explicit_model() {
        let embedder = Arc::new(RecordingEmbedder::default());
        let (indexer, _store, dir) = setup(embedder);
        let path = dir.path().join("a.txt");
        std::fs::write(&path, "abc").unwrap();

        let file = indexer.index_path(&path, Some("mxbai")).await.unwrap();
        assert_eq!(file.model, "mxbai");
    }

    #[tokio::test]
    async fn test_invalid_utf8_is_replaced() {
        let embedder = Arc::new(RecordingEmbedder::default());
        let (indexer, _store, dir) = setup(embedder);
        let path = dir.path().join("bin.dat");
        std::fs::write(&path, [b'o', b'k', 0xff]).unwrap();

        let file = indexer.index_path(&path, None).await.unwrap();
        assert_eq!(file.content, "ok\u{fffd}");
        assert_eq!(file.file_size, 3);
    }

    #[tokio::test]
    async fn test_embedding_failure_stores_nothing() {
        let embedder = Arc::new(RecordingEmbedder {
            fail: true,
            ..Default::default()
        });
        let (indexer, store, dir) = setup(embedder);
        let path = dir.path().join("a.txt");
        std::fs::write(&path, "abc").unwrap();

        let err = indexer.index_path(&path, None).await.unwrap_err();
        assert!(matches!(err, LanternError::UpstreamFailed(_)));
        assert!(store.get_file(&path).unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_missing_file() {
        let embedder = Arc::new(RecordingEmbedder::default());
        let (indexer, _store, dir) = setup(embedder.clone());
        let err = indexer
            .index_path(&dir.path().join("missing"), None)
            .await
            .unwrap_err();
        assert!(matches!(err, LanternError::Io(_)));
        assert!(embedder.calls.lock().unwrap().is_empty());
    }
}
