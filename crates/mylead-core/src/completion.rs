//! Completion capability seam: the external LLM service consumed as an
//! opaque text-in/text-out (or fragment-stream-out) function.

use crate::prompt::PromptSegment;
use tokio::sync::mpsc;

/// Fixed generation settings sent with every completion call.
#[derive(Debug, Clone)]
pub struct GenerationConfig {
    /// -1 disables any bounded thinking budget on the remote side.
    pub thinking_budget: i64,
    pub response_mime_type: String,
}

impl GenerationConfig {
    /// Unrestricted thinking, plain-text output. The broker always sends
    /// this; there are no per-request generation knobs.
    pub fn unbounded_text() -> Self {
        Self {
            thinking_budget: -1,
            response_mime_type: "text/plain".to_string(),
        }
    }
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self::unbounded_text()
    }
}

/// Failures surfaced by a completion backend. Consumed only at the
/// orchestrator boundary, which maps every variant to the fixed
/// unavailability answer; no variant ever reaches an end user verbatim.
#[derive(Debug, thiserror::Error)]
pub enum CompletionError {
    #[error("failed to reach the completion service: {0}")]
    Transport(String),
    #[error("completion service rejected the request: {0}")]
    Api(String),
    #[error("completion service returned an unreadable response: {0}")]
    Malformed(String),
    #[error("completion stream ended abnormally: {0}")]
    Stream(String),
}

/// Result of one completion call: a single final text, or a stream of text
/// fragments delivered in generation order.
pub enum CompletionOutput {
    Full(String),
    Stream(mpsc::Receiver<Result<String, CompletionError>>),
}

/// Trait implemented by completion backends (live API, mock).
#[async_trait::async_trait]
pub trait CompletionClient: Send + Sync {
    /// Identifier of the backing model, for logs.
    fn model_id(&self) -> &str;

    /// Performs a single completion attempt for the assembled segments.
    /// No retry happens anywhere in the broker.
    async fn complete(
        &self,
        segments: &[PromptSegment],
        config: &GenerationConfig,
    ) -> Result<CompletionOutput, CompletionError>;
}

/// Collapses a completion result into one final string. Fragments are
/// concatenated strictly in arrival order; payload-less fragments are
/// skipped; a mid-stream failure discards any partially aggregated text.
/// The final string is trimmed.
pub async fn aggregate(output: CompletionOutput) -> Result<String, CompletionError> {
    match output {
        CompletionOutput::Full(text) => Ok(text.trim().to_string()),
        CompletionOutput::Stream(mut rx) => {
            let mut full = String::new();
            while let Some(fragment) = rx.recv().await {
                match fragment {
                    Ok(chunk) if chunk.is_empty() => continue,
                    Ok(chunk) => full.push_str(&chunk),
                    Err(e) => return Err(e),
                }
            }
            Ok(full.trim().to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn streamed(fragments: Vec<Result<String, CompletionError>>) -> CompletionOutput {
        let (tx, rx) = mpsc::channel(fragments.len().max(1));
        for fragment in fragments {
            tx.send(fragment).await.unwrap();
        }
        CompletionOutput::Stream(rx)
    }

    #[tokio::test]
    async fn full_output_is_trimmed() {
        let out = aggregate(CompletionOutput::Full("  answer \n".into())).await;
        assert_eq!(out.unwrap(), "answer");
    }

    #[tokio::test]
    async fn fragments_concatenate_in_arrival_order() {
        let out = streamed(vec![
            Ok("Hello".to_string()),
            Ok(" ".to_string()),
            Ok("world".to_string()),
        ])
        .await;
        assert_eq!(aggregate(out).await.unwrap(), "Hello world");
    }

    #[tokio::test]
    async fn empty_fragments_are_skipped() {
        let out = streamed(vec![
            Ok(String::new()),
            Ok("text".to_string()),
            Ok(String::new()),
        ])
        .await;
        assert_eq!(aggregate(out).await.unwrap(), "text");
    }

    #[tokio::test]
    async fn mid_stream_failure_discards_partial_text() {
        let out = streamed(vec![
            Ok("partial".to_string()),
            Err(CompletionError::Stream("connection reset".into())),
        ])
        .await;
        assert!(aggregate(out).await.is_err());
    }
}
