//! Mode selection between the mock backend and the live Gemini API.

use std::sync::Arc;

use async_trait::async_trait;
use mylead_core::{
    AppConfig, CompletionClient, CompletionError, CompletionOutput, GenerationConfig,
    PromptSegment,
};

use crate::{GeminiModel, MockModel};

const ENV_LLM_MODE: &str = "MYLEAD_LLM_MODE";

/// Mode for LLM invocation: mock (deterministic local generation) or live
/// (Gemini API).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum LlmMode {
    #[default]
    Mock,
    Live,
}

impl LlmMode {
    /// Env override first (`MYLEAD_LLM_MODE`), then the configured mode.
    /// Anything other than "live" means mock.
    pub fn resolve(configured: &str) -> Self {
        let mode = std::env::var(ENV_LLM_MODE).unwrap_or_else(|_| configured.to_string());
        match mode.as_str() {
            "live" => LlmMode::Live,
            _ => LlmMode::Mock,
        }
    }
}

/// Routes completion calls to the backend selected at startup. Live mode
/// without a usable API key falls back to the mock backend so the gateway
/// stays serviceable.
pub struct ModelRouter {
    inner: Arc<dyn CompletionClient>,
    mode: LlmMode,
}

impl ModelRouter {
    pub fn from_config(config: &AppConfig) -> Self {
        let mode = LlmMode::resolve(&config.llm_mode);
        match mode {
            LlmMode::Live => match GeminiModel::from_env(&config.model) {
                Ok(model) => Self {
                    inner: Arc::new(model),
                    mode,
                },
                Err(e) => {
                    tracing::warn!(
                        target: "mylead::model",
                        error = %e,
                        "live mode unavailable; falling back to mock backend"
                    );
                    Self {
                        inner: Arc::new(MockModel::new()),
                        mode: LlmMode::Mock,
                    }
                }
            },
            LlmMode::Mock => Self {
                inner: Arc::new(MockModel::new()),
                mode,
            },
        }
    }

    pub fn mode(&self) -> LlmMode {
        self.mode
    }
}

#[async_trait]
impl CompletionClient for ModelRouter {
    fn model_id(&self) -> &str {
        self.inner.model_id()
    }

    async fn complete(
        &self,
        segments: &[PromptSegment],
        config: &GenerationConfig,
    ) -> Result<CompletionOutput, CompletionError> {
        self.inner.complete(segments, config).await
    }
}
