//! Dummy LLM provider: echoes input back prefixed with `[echo]`.
//! Used for exercising the full request path without any model at all.

use crate::llm::ProviderError;

#[derive(Debug, Clone)]
pub struct DummyProvider;

impl DummyProvider {
    pub async fn complete(&self, content: &str) -> Result<String, ProviderError> {
        Ok(format!("[echo] {content}"))
    }
}
