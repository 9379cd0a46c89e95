//! Text generation capability.
//!
//! The crate never talks to a language model directly; callers inject a
//! [`TextGenerator`] and tools hand it chat-style messages.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Speaker of a chat message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// One message of a chat prompt
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

#[derive(Debug, Error)]
pub enum GenerationError {
    /// The generator failed (network, quota, model error)
    #[error("Generation backend error: {0}")]
    Backend(String),

    /// The generator answered with nothing usable
    #[error("Generation backend returned an empty response")]
    EmptyResponse,
}

/// `generate(messages) -> text`
#[async_trait]
pub trait TextGenerator: Send + Sync + std::fmt::Debug {
    async fn generate(&self, messages: &[ChatMessage]) -> Result<String, GenerationError>;
}

/// Returns a fixed reply and remembers the last prompt it saw.
#[derive(Debug, Default)]
pub struct StaticGenerator {
    reply: String,
    last_prompt: std::sync::Mutex<Vec<ChatMessage>>,
}

impl StaticGenerator {
    pub fn new(reply: impl Into<String>) -> Self {
        Self {
            reply: reply.into(),
            last_prompt: std::sync::Mutex::new(Vec::new()),
        }
    }

    /// Messages from the most recent `generate` call
    pub fn last_prompt(&self) -> Vec<ChatMessage> {
        self.last_prompt
            .lock()
            .map(|guard| guard.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl TextGenerator for StaticGenerator {
    async fn generate(&self, messages: &[ChatMessage]) -> Result<String, GenerationError> {
        if let Ok(mut guard) = self.last_prompt.lock() {
            *guard = messages.to_vec();
        }
        Ok(self.reply.clone())
    }
}
