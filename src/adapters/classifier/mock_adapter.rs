//! Mock classifier for running without the classification service.
//!
//! Keyword heuristic: work-related vocabulary is productive, everything else is not.

use crate::domain::DomainError;
use crate::ports::{ClassifiedMessage, ClassifierPort, ClassifyRequest};
use std::time::Duration;
use tracing::info;

const PRODUCTIVE_KEYWORDS: &[&str] = &[
    "deploy", "release", "bug", "fix", "merge", "review", "task", "deadline", "meeting",
    "standup", "ticket", "build", "test", "pr",
];

/// Mock classifier. Simulates network latency with a configurable delay.
pub struct MockClassifier {
    delay_ms: u64,
}

impl MockClassifier {
    /// Create a mock classifier with default delay (100ms).
    pub fn new() -> Self {
        Self { delay_ms: 100 }
    }

    pub fn with_delay(delay_ms: u64) -> Self {
        Self { delay_ms }
    }

    fn label_for(text: &str) -> u32 {
        let lower = text.to_lowercase();
        let productive = lower
            .split(|c: char| !c.is_alphanumeric())
            .any(|word| PRODUCTIVE_KEYWORDS.contains(&word));
        u32::from(productive)
    }
}

impl Default for MockClassifier {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl ClassifierPort for MockClassifier {
    async fn classify(
        &self,
        batch: &[ClassifyRequest],
    ) -> Result<Vec<ClassifiedMessage>, DomainError> {
        info!(count = batch.len(), "[MOCK] Simulating classification");

        tokio::time::sleep(Duration::from_millis(self.delay_ms)).await;

        Ok(batch
            .iter()
            .map(|m| ClassifiedMessage {
                message_id: m.message_id,
                text: m.text.clone(),
                label: Self::label_for(&m.text),
                chat_id: m.chat_id,
            })
            .collect())
    }
}
