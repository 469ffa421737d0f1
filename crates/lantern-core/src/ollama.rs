//! Inference daemon capabilities and the Ollama HTTP client.

use crate::{LanternError, Result};
use async_trait::async_trait;
use lantern_types::{ChatReply, ModelInfo, PromptMessage};
use reqwest::{Client, Response};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

pub const DEFAULT_OLLAMA_URL: &str = "http://localhost:11434";

/// Generates a chat reply from a message history.
#[async_trait]
pub trait ChatProvider: Send + Sync {
    async fn chat(&self, model: &str, messages: &[PromptMessage]) -> Result<ChatReply>;
}

/// Produces an embedding vector for a piece of text.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    async fn embed(&self, model: &str, text: &str) -> Result<Vec<f32>>;
}

/// Lists models installed on the daemon.
#[async_trait]
pub trait ModelCatalog: Send + Sync {
    async fn list_models(&self) -> Result<Vec<ModelInfo>>;

    /// Check that the daemon answers.
    async fn ping(&self) -> Result<()> {
        self.list_models().await.map(|_| ())
    }
}

/// Client for a local Ollama daemon.
#[derive(Clone)]
pub struct OllamaClient {
    base_url: String,
    http: Client,
}

impl OllamaClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let http = Client::builder().timeout(timeout).build()?;
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Ok(Self { base_url, http })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

/// Map non-2xx responses to `UpstreamFailed`, keeping status and body.
async fn check_status(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(LanternError::UpstreamFailed(format!(
        "daemon returned {status}: {body}"
    )))
}

#[derive(Debug, Serialize)]
struct OllamaChatRequest<'a> {
    model: &'a str,
    messages: &'a [PromptMessage],
    stream: bool,
}

#[derive(Debug, Deserialize)]
struct OllamaChatResponse {
    #[serde(default)]
    model: String,
    message: OllamaMessage,
}

#[derive(Debug, Deserialize)]
struct OllamaMessage {
    content: String,
}

#[derive(Debug, Serialize)]
struct OllamaEmbeddingRequest<'a> {
    model: &'a str,
    prompt: &'a str,
}

#[derive(Debug, Deserialize)]
struct OllamaEmbeddingResponse {
    embedding: Vec<f32>,
}

#[derive(Debug, Deserialize)]
struct OllamaTagsResponse {
    #[serde(default)]
    models: Vec<ModelInfo>,
}

#[async_trait]
impl ChatProvider for OllamaClient {
    async fn chat(&self, model: &str, messages: &[PromptMessage]) -> Result<ChatReply> {
        debug!(target: "lantern::ollama", "Chat request: model={}, messages={}", model, messages.len());
        let request = OllamaChatRequest {
            model,
            messages,
            stream: false,
        };
        let response = self
            .http
            .post(self.url("/api/chat"))
            .json(&request)
            .send()
            .await?;
        let response: OllamaChatResponse = check_status(response).await?.json().await?;

        let model = if response.model.is_empty() {
            model.to_string()
        } else {
            response.model
        };
        Ok(ChatReply {
            content: response.message.content,
            model,
        })
    }
}

#[async_trait]
impl EmbeddingProvider for OllamaClient {
    async fn embed(&self, model: &str, text: &str) -> Result<Vec<f32>> {
        debug!(target: "lantern::ollama", "Embedding request: model={}, chars={}", model, text.len());
        let request = OllamaEmbeddingRequest {
            model,
            prompt: text,
        };
        let response = self
            .http
            .post(self.url("/api/embeddings"))
            .json(&request)
            .send()
            .await?;
        let response: OllamaEmbeddingResponse = check_status(response).await?.json().await?;
        Ok(response.embedding)
    }
}

#[async_trait]
impl ModelCatalog for OllamaClient {
    async fn list_models(&self) -> Result<Vec<ModelInfo>> {
        let response = self.http.get(self.url("/api/tags")).send().await?;
        let response: OllamaTagsResponse = check_status(response).await?.json().await?;
        Ok(response.models)
    }

    async fn ping(&self) -> Result<()> {
        let response = self.http.get(self.url("/api/tags")).send().await?;
        check_status(response).await?;
        Ok(())
    }
}
