//! Chat orchestration: resolve model and system prompt, build the history,
//! call the inference daemon, and persist both sides of the exchange.

use crate::chat_store::ChatStore;
use crate::config_store::ConfigStore;
use crate::ollama::ChatProvider;
use crate::{LanternError, Result};
use lantern_types::{keys, ChatRequest, ChatSession, ChatTurn, PromptMessage, Role};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

pub const DEFAULT_CHAT_MODEL: &str = "qwen2.5:0.5b";
pub const DEFAULT_SYSTEM_PROMPT: &str =
    "You are a helpful assistant running on the user's machine. Answer clearly and concisely.";

/// Values used when neither the request nor the settings store provide one.
#[derive(Debug, Clone)]
pub struct OrchestratorDefaults {
    pub model: String,
    pub system_prompt: String,
}

impl Default for OrchestratorDefaults {
    fn default() -> Self {
        Self {
            model: DEFAULT_CHAT_MODEL.to_string(),
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
        }
    }
}

pub struct ChatOrchestrator {
    chats: Arc<ChatStore>,
    config: Arc<ConfigStore>,
    provider: Arc<dyn ChatProvider>,
    defaults: OrchestratorDefaults,
}

impl ChatOrchestrator {
    pub fn new(
        chats: Arc<ChatStore>,
        config: Arc<ConfigStore>,
        provider: Arc<dyn ChatProvider>,
        defaults: OrchestratorDefaults,
    ) -> Self {
        Self {
            chats,
            config,
            provider,
            defaults,
        }
    }

    /// Run one chat turn.
    ///
    /// The user message is persisted before the daemon is called and stays
    /// even if the call fails or is cancelled. The assistant reply is written
    /// best effort: a failed write is logged and the reply still returned.
    pub async fn chat(&self, request: ChatRequest, cancel: &CancellationToken) -> Result<ChatTurn> {
        if request.message.is_empty() {
            return Err(LanternError::InvalidRequest(
                "message must not be empty".to_string(),
            ));
        }

        let model = self.resolve_model(request.model.as_deref())?;
        let system_prompt = self.resolve_system_prompt()?;

        let (session_id, mut history) = match request.session_id {
            Some(session_id) => {
                self.chats.get_session(&session_id)?;
                let mut history: Vec<PromptMessage> = self
                    .chats
                    .get_messages(&session_id)?
                    .into_iter()
                    .map(PromptMessage::from)
                    .collect();
                if history.is_empty() {
                    // Not persisted; the session stays as it was.
                    history.push(PromptMessage::system(system_prompt));
                }
                (session_id, history)
            }
            None => {
                let session = self.create_seeded_session(&model, None, &system_prompt)?;
                (session.session_id, vec![PromptMessage::system(system_prompt)])
            }
        };

        history.push(PromptMessage::user(request.message.as_str()));
        self.chats
            .add_message(&session_id, &Role::User, &request.message)?;

        debug!(
            target: "lantern::chat",
            "Session {}: sending {} messages to {}",
            session_id,
            history.len(),
            model
        );

        let reply = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                warn!(target: "lantern::chat", "Session {}: chat cancelled", session_id);
                return Err(LanternError::Cancelled);
            }
            result = self.provider.chat(&model, &history) => match result {
                Ok(reply) => reply,
                Err(e) => {
                    error!(target: "lantern::chat", "Session {}: inference failed: {}", session_id, e);
                    return Err(match e {
                        LanternError::UpstreamFailed(_) => e,
                        other => LanternError::UpstreamFailed(other.to_string()),
                    });
                }
            },
        };

        if let Err(e) = self
            .chats
            .add_message(&session_id, &Role::Assistant, &reply.content)
        {
            error!(
                target: "lantern::chat",
                "Session {}: failed to save assistant reply: {}",
                session_id,
                e
            );
        }

        let model = if reply.model.is_empty() {
            model
        } else {
            reply.model
        };
        Ok(ChatTurn {
            session_id,
            message: reply.content,
            model,
        })
    }

    /// Create a session seeded with the system prompt.
    pub fn create_session(&self, model: Option<&str>, title: Option<&str>) -> Result<ChatSession> {
        let model = self.resolve_model(model)?;
        let system_prompt = self.resolve_system_prompt()?;
        self.create_seeded_session(&model, title, &system_prompt)
    }

    fn create_seeded_session(
        &self,
        model: &str,
        title: Option<&str>,
        system_prompt: &str,
    ) -> Result<ChatSession> {
        let session = self.chats.create_session(model, title)?;
        self.chats
            .add_message(&session.session_id, &Role::System, system_prompt)?;
        info!(target: "lantern::chat", "Started session {} with {}", session.session_id, model);
        Ok(session)
    }

    fn resolve_model(&self, requested: Option<&str>) -> Result<String> {
        if let Some(model) = requested.filter(|m| !m.is_empty()) {
            return Ok(model.to_string());
        }
        Ok(self
            .config
            .get_value(keys::DEFAULT_MODEL)?
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| self.defaults.model.clone()))
    }

    fn resolve_system_prompt(&self) -> Result<String> {
        Ok(self
            .config
            .get_value(keys::SYSTEM_PROMPT)?
            .filter(|p| !p.is_empty())
            .unwrap_or_else(|| self.defaults.system_prompt.clone()))
    }
}
