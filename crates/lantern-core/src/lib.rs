//! Persistence and chat orchestration for Lantern.

mod chat_store;
mod config_store;
mod db;
pub mod embedding;
mod error;
mod file_index;
mod indexer;
mod ollama;
mod orchestrator;

pub use chat_store::{ChatStore, DEFAULT_SESSION_LIST_LIMIT};
pub use config_store::ConfigStore;
pub use db::{Database, DatabaseStats};
pub use error::LanternError;
pub use file_index::{hash_file, FileIndexStore, DEFAULT_FILE_LIST_LIMIT};
pub use indexer::{FileIndexer, DEFAULT_EMBEDDING_MODEL};
pub use ollama::{ChatProvider, EmbeddingProvider, ModelCatalog, OllamaClient, DEFAULT_OLLAMA_URL};
pub use orchestrator::{
    ChatOrchestrator, OrchestratorDefaults, DEFAULT_CHAT_MODEL, DEFAULT_SYSTEM_PROMPT,
};

/// Result type for Lantern operations.
pub type Result<T> = std::result::Result<T, LanternError>;
