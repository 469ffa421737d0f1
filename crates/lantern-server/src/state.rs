//! Shared application state.

use crate::config::Config;
use lantern_core::{
    ChatOrchestrator, ChatProvider, ChatStore, ConfigStore, Database, EmbeddingProvider,
    FileIndexStore, FileIndexer, ModelCatalog, OllamaClient, OrchestratorDefaults,
};
use std::sync::Arc;

/// Daemon capabilities the server depends on.
#[derive(Clone)]
pub struct Providers {
    pub chat: Arc<dyn ChatProvider>,
    pub embeddings: Arc<dyn EmbeddingProvider>,
    pub models: Arc<dyn ModelCatalog>,
}

impl Providers {
    /// All three capabilities served by one Ollama client.
    pub fn ollama(client: OllamaClient) -> Self {
        let client = Arc::new(client);
        Self {
            chat: client.clone(),
            embeddings: client.clone(),
            models: client,
        }
    }
}

/// Shared application state.
pub struct AppState {
    pub db: Arc<Database>,
    pub chats: Arc<ChatStore>,
    pub settings: Arc<ConfigStore>,
    pub files: Arc<FileIndexStore>,
    pub orchestrator: ChatOrchestrator,
    pub indexer: FileIndexer,
    pub models: Arc<dyn ModelCatalog>,
    pub config: Config,
}

impl AppState {
    pub fn new(config: Config) -> lantern_core::Result<Self> {
        let client = OllamaClient::new(config.ollama_url.clone(), config.request_timeout())?;
        Self::with_providers(config, Providers::ollama(client))
    }

    /// Build state around the given daemon capabilities.
    pub fn with_providers(config: Config, providers: Providers) -> lantern_core::Result<Self> {
        let db = Arc::new(Database::open(&config.db_path)?);
        let chats = Arc::new(ChatStore::new(db.clone()));
        let settings = Arc::new(ConfigStore::new(db.clone()));
        let files = Arc::new(FileIndexStore::new(db.clone()));

        let orchestrator = ChatOrchestrator::new(
            chats.clone(),
            settings.clone(),
            providers.chat,
            OrchestratorDefaults {
                model: config.default_model.clone(),
                system_prompt: config.system_prompt.clone(),
            },
        );
        let indexer = FileIndexer::new(
            files.clone(),
            providers.embeddings,
            config.embedding_model.clone(),
        );

        Ok(Self {
            db,
            chats,
            settings,
            files,
            orchestrator,
            indexer,
            models: providers.models,
            config,
        })
    }
}
