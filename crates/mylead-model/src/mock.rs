//! Deterministic in-process backend for tests and local development.

use async_trait::async_trait;
use mylead_core::{
    CompletionClient, CompletionError, CompletionOutput, GenerationConfig, PromptSegment,
};
use tokio::sync::mpsc;

const MOCK_MODEL_ID: &str = "mock";

/// Mock completion backend. Returns a canned reply derived from the user
/// question, streamed word by word like the live backend so the aggregation
/// path is exercised end to end.
pub struct MockModel {
    streamed: bool,
}

impl MockModel {
    pub fn new() -> Self {
        Self { streamed: true }
    }

    /// Single-shot variant: one final string, no fragment stream.
    pub fn single_shot() -> Self {
        Self { streamed: false }
    }

    fn canned_reply(segments: &[PromptSegment]) -> String {
        let question = segments.last().map(|s| s.text.as_str()).unwrap_or("");
        let preview: String = question.chars().take(80).collect();
        format!(
            "[mock] Thanks for asking about \"{preview}\". A staff member can confirm the specifics, but here is the general guidance."
        )
    }
}

impl Default for MockModel {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CompletionClient for MockModel {
    fn model_id(&self) -> &str {
        MOCK_MODEL_ID
    }

    async fn complete(
        &self,
        segments: &[PromptSegment],
        _config: &GenerationConfig,
    ) -> Result<CompletionOutput, CompletionError> {
        let reply = Self::canned_reply(segments);
        if !self.streamed {
            return Ok(CompletionOutput::Full(reply));
        }

        let (tx, rx) = mpsc::channel(16);
        tokio::spawn(async move {
            for word in reply.split_inclusive(' ') {
                if tx.send(Ok(word.to_string())).await.is_err() {
                    break;
                }
            }
        });
        Ok(CompletionOutput::Stream(rx))
    }
}
