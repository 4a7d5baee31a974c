//! Mock provider: canned tutor replies from [`MockTutor`].
//!
//! Ignores the system prompt and history; only the student's message drives
//! the reply.

use std::sync::Arc;

use crate::llm::ProviderError;
use crate::tutor::mock::MockTutor;

#[derive(Debug, Clone)]
pub struct MockProvider {
    tutor: Arc<MockTutor>,
}

impl MockProvider {
    pub fn new(simulate_delay: bool) -> Self {
        Self { tutor: Arc::new(MockTutor::new(simulate_delay)) }
    }

    pub async fn complete(&self, content: &str) -> Result<String, ProviderError> {
        Ok(self.tutor.respond(content).await)
    }

    /// Restart the round-robin for a new conversation.
    pub fn reset(&self) {
        self.tutor.reset();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn clones_share_round_robin_state() {
        let a = MockProvider::new(false);
        let b = a.clone();
        let first = a.complete("x = 1").await.unwrap();
        let second = b.complete("x = 1").await.unwrap();
        assert_ne!(first, second);

        b.reset();
        assert_eq!(a.complete("x = 1").await.unwrap(), first);
    }
}
