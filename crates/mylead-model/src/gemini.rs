//! Live Gemini backend.
//!
//! One `streamGenerateContent` call per request, consumed as server-sent
//! events. Fragments are forwarded through an mpsc channel in arrival order;
//! a mid-stream failure is delivered through the same channel so the
//! aggregator can discard the partial answer.

use async_trait::async_trait;
use futures_util::StreamExt;
use mylead_core::{
    CompletionClient, CompletionError, CompletionOutput, GenerationConfig, PromptSegment,
    SegmentRole,
};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

const DEFAULT_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Environment variable holding the Gemini API key. Keys are never read
/// from config files.
pub const ENV_API_KEY: &str = "GEMINI_API_KEY";

// --- Gemini-specific request and response structures ---

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest<'a> {
    contents: Vec<Content<'a>>,
    generation_config: WireGenerationConfig<'a>,
}

#[derive(Serialize)]
struct Content<'a> {
    role: &'static str,
    parts: Vec<Part<'a>>,
}

#[derive(Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct WireGenerationConfig<'a> {
    thinking_config: ThinkingConfig,
    response_mime_type: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ThinkingConfig {
    thinking_budget: i64,
}

#[derive(Deserialize, Debug)]
struct GenerateChunk {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize, Debug)]
struct Candidate {
    #[serde(default)]
    content: Option<ChunkContent>,
}

#[derive(Deserialize, Debug)]
struct ChunkContent {
    #[serde(default)]
    parts: Vec<ChunkPart>,
}

#[derive(Deserialize, Debug)]
struct ChunkPart {
    #[serde(default)]
    text: Option<String>,
}

fn role_tag(role: SegmentRole) -> &'static str {
    match role {
        SegmentRole::System => "system",
        SegmentRole::User => "user",
    }
}

/// Extracts the concatenated text payload of one streamed chunk. Chunks
/// without any text (safety metadata, usage counts) yield an empty string.
fn chunk_text(chunk: &GenerateChunk) -> String {
    chunk
        .candidates
        .iter()
        .filter_map(|c| c.content.as_ref())
        .flat_map(|c| c.parts.iter())
        .filter_map(|p| p.text.as_deref())
        .collect()
}

/// Returns the JSON payload of an SSE `data:` line, if this is one.
fn sse_payload(line: &str) -> Option<&str> {
    line.strip_prefix("data:")
        .map(str::trim_start)
        .filter(|payload| !payload.is_empty())
}

/// Client for the Gemini `streamGenerateContent` REST endpoint.
pub struct GeminiModel {
    client: reqwest::Client,
    api_base: String,
    api_key: String,
    model: String,
}

impl GeminiModel {
    pub fn new(model: &str, api_key: &str) -> Result<Self, CompletionError> {
        let client = reqwest::Client::builder()
            .build()
            .map_err(|e| CompletionError::Transport(e.to_string()))?;
        Ok(Self {
            client,
            api_base: DEFAULT_API_BASE.to_string(),
            api_key: api_key.to_string(),
            model: model.to_string(),
        })
    }

    /// Reads the API key from `GEMINI_API_KEY`.
    pub fn from_env(model: &str) -> Result<Self, CompletionError> {
        let key = std::env::var(ENV_API_KEY)
            .map_err(|_| CompletionError::Api(format!("{ENV_API_KEY} is not set")))?;
        Self::new(model, &key)
    }

    fn request_body<'a>(
        segments: &'a [PromptSegment],
        config: &'a GenerationConfig,
    ) -> GenerateRequest<'a> {
        GenerateRequest {
            contents: segments
                .iter()
                .map(|s| Content {
                    role: role_tag(s.role),
                    parts: vec![Part { text: &s.text }],
                })
                .collect(),
            generation_config: WireGenerationConfig {
                thinking_config: ThinkingConfig {
                    thinking_budget: config.thinking_budget,
                },
                response_mime_type: &config.response_mime_type,
            },
        }
    }
}

#[async_trait]
impl CompletionClient for GeminiModel {
    fn model_id(&self) -> &str {
        &self.model
    }

    async fn complete(
        &self,
        segments: &[PromptSegment],
        config: &GenerationConfig,
    ) -> Result<CompletionOutput, CompletionError> {
        let url = format!(
            "{}/models/{}:streamGenerateContent",
            self.api_base, self.model
        );
        let body = Self::request_body(segments, config);
        let response = self
            .client
            .post(&url)
            .query(&[("alt", "sse"), ("key", self.api_key.as_str())])
            .json(&body)
            .send()
            .await
            .map_err(|e| CompletionError::Transport(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(CompletionError::Api(format!("{status}: {error_text}")));
        }

        let (tx, rx) = mpsc::channel(32);
        tokio::spawn(async move {
            let mut bytes = response.bytes_stream();
            let mut buffer = String::new();
            while let Some(item) = bytes.next().await {
                let chunk = match item {
                    Ok(b) => b,
                    Err(e) => {
                        let _ = tx.send(Err(CompletionError::Stream(e.to_string()))).await;
                        return;
                    }
                };
                buffer.push_str(&String::from_utf8_lossy(&chunk));
                while let Some(pos) = buffer.find('\n') {
                    let line = buffer[..pos].trim_end_matches('\r').to_string();
                    buffer.drain(..=pos);
                    let Some(payload) = sse_payload(&line) else {
                        continue;
                    };
                    match serde_json::from_str::<GenerateChunk>(payload) {
                        Ok(parsed) => {
                            if tx.send(Ok(chunk_text(&parsed))).await.is_err() {
                                return;
                            }
                        }
                        Err(e) => {
                            let _ = tx
                                .send(Err(CompletionError::Malformed(e.to_string())))
                                .await;
                            return;
                        }
                    }
                }
            }
        });

        tracing::debug!(
            target: "mylead::model",
            model = %self.model,
            segments = segments.len(),
            "completion stream opened"
        );
        Ok(CompletionOutput::Stream(rx))
    }
}
