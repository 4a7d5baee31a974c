//! LLM provider abstraction.
//!
//! `LlmProvider` is an enum over concrete provider implementations.
//! Add a new variant + module in `providers/` for each additional backend.
//!
//! Provider instances are shared immutable capabilities: clone them freely.
//! Enum dispatch keeps `complete` an `async fn` without trait objects.

pub mod providers;

use serde::{Deserialize, Serialize};
use thiserror::Error;

// ── Error ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("unknown provider: {0}")]
    UnknownProvider(String),
    #[error("provider request failed: {0}")]
    Request(String),
}

// ── Request shape ─────────────────────────────────────────────────────────────

/// Who said a line of conversation history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

/// One earlier message of the conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatTurn {
    pub role: Role,
    pub content: String,
}

/// A single completion round-trip: system prompt, prior turns, new message.
#[derive(Debug, Clone, Default)]
pub struct Completion {
    pub system: Option<String>,
    pub history: Vec<ChatTurn>,
    pub content: String,
}

// ── Provider enum ─────────────────────────────────────────────────────────────

/// All available provider backends.
#[derive(Debug, Clone)]
pub enum LlmProvider {
    Dummy(providers::dummy::DummyProvider),
    Mock(providers::mock::MockProvider),
    OpenAiCompatible(providers::openai_compatible::OpenAiCompatibleProvider),
}

impl LlmProvider {
    /// Send the completion to the provider and return its text reply.
    pub async fn complete(&self, request: &Completion) -> Result<String, ProviderError> {
        match self {
            LlmProvider::Dummy(p) => p.complete(&request.content).await,
            LlmProvider::Mock(p) => p.complete(&request.content).await,
            LlmProvider::OpenAiCompatible(p) => p.complete(request).await,
        }
    }

    /// Short provider name for logs and the health endpoint.
    pub fn name(&self) -> &'static str {
        match self {
            LlmProvider::Dummy(_) => "dummy",
            LlmProvider::Mock(_) => "mock",
            LlmProvider::OpenAiCompatible(_) => "openai",
        }
    }

    /// The mock backend, when active.  Used for conversation resets.
    pub fn as_mock(&self) -> Option<&providers::mock::MockProvider> {
        match self {
            LlmProvider::Mock(p) => Some(p),
            _ => None,
        }
    }
}
