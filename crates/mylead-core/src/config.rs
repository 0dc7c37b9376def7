//! Gateway configuration: TOML file plus `MYLEAD`-prefixed env overrides.

use crate::persona::PersonaProfile;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Global application configuration. Load from TOML or env.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Application identity for startup logs.
    pub app_name: String,
    /// HTTP port for the gateway.
    pub port: u16,
    /// Path to the `---`-delimited knowledge corpus. A missing file is not
    /// fatal; the broker runs with an empty store.
    pub knowledge_path: String,
    /// LLM mode ("mock" or "live").
    pub llm_mode: String,
    /// Remote model identifier used in live mode.
    pub model: String,
    /// Maximum number of knowledge entries injected per request.
    #[serde(default = "default_top_n")]
    pub top_n: usize,
    /// Whether the completion target accepts a distinguished system role.
    /// When false, the persona segment is folded into a user-role segment.
    #[serde(default = "default_true")]
    pub system_role_supported: bool,
    /// Deployment persona.
    #[serde(default)]
    pub persona: PersonaProfile,
}

fn default_top_n() -> usize {
    crate::knowledge::DEFAULT_TOP_N
}

fn default_true() -> bool {
    true
}

impl AppConfig {
    /// Load config from file and environment. Precedence: env `MYLEAD_CONFIG`
    /// path > `config/gateway.toml` > defaults, then `MYLEAD__*` env keys on
    /// top of whichever file applied.
    pub fn load() -> Result<Self, config::ConfigError> {
        let config_path =
            std::env::var("MYLEAD_CONFIG").unwrap_or_else(|_| "config/gateway.toml".to_string());
        let builder = config::Config::builder()
            .set_default("app_name", "MyLEAD Gateway")?
            .set_default("port", 8080_i64)?
            .set_default("knowledge_path", "./data/knowledge.txt")?
            .set_default("llm_mode", "mock")?
            .set_default("model", "gemini-2.5-pro")?;

        let path = Path::new(&config_path);
        let builder = if path.exists() {
            builder.add_source(config::File::from(path))
        } else {
            builder
        };

        let built = builder
            .add_source(config::Environment::with_prefix("MYLEAD").separator("__"))
            .build()?;

        built.try_deserialize()
    }
}
