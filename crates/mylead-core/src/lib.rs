//! mylead-core: broker core library (session types, knowledge retrieval,
//! persona, prompt assembly, request orchestrator).
//!
//! The gateway add-on wires these pieces together with a completion backend
//! from `mylead-model`; everything here is transport-agnostic.

mod completion;
mod config;
mod knowledge;
mod orchestrator;
mod persona;
mod prompt;

pub use completion::{
    aggregate, CompletionClient, CompletionError, CompletionOutput, GenerationConfig,
};
pub use config::AppConfig;
pub use knowledge::{retrieve, KnowledgeEntry, KnowledgeStore, DEFAULT_TOP_N};
pub use orchestrator::{
    AskOutcome, ModelAnswer, RequestOrchestrator, SessionContext, EMPTY_QUERY_REPLY,
};
pub use persona::PersonaProfile;
pub use prompt::{PromptAssembler, PromptSegment, SegmentRole};
