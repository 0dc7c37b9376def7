//! Use-case entry point: validate, retrieve, build persona, assemble,
//! complete, aggregate.
//!
//! This is the only place where a completion failure becomes user-visible
//! text. The orchestrator owns its collaborators explicitly (no ambient
//! globals), so tests can substitute any of them.

use std::sync::Arc;

use crate::completion::{aggregate, CompletionClient, CompletionError, GenerationConfig};
use crate::knowledge::{retrieve, KnowledgeStore, DEFAULT_TOP_N};
use crate::persona::PersonaProfile;
use crate::prompt::PromptAssembler;

/// Fixed reply for an empty or whitespace-only question. This is a
/// user-input guard, not an error: nothing is retrieved and no model call
/// is made.
pub const EMPTY_QUERY_REPLY: &str = "Please enter a question.";

/// Per-request session metadata. Stateless: the caller resends whatever
/// context it wants preserved.
#[derive(Debug, Clone, Default)]
pub struct SessionContext {
    pub query: String,
    pub display_name: Option<String>,
    pub first_turn: bool,
}

/// Outcome tag for one handled request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AskOutcome {
    /// The model produced an answer.
    Answered,
    /// The empty-query guard tripped; the fixed prompt was returned.
    EmptyQuery,
    /// The completion call failed; the fixed degraded text was returned.
    Unavailable,
}

/// Final answer handed back to the transport layer. `text` is always
/// non-empty for a non-empty query.
#[derive(Debug, Clone)]
pub struct ModelAnswer {
    pub text: String,
    pub outcome: AskOutcome,
}

/// Drives one request through the retrieval and completion pipeline.
pub struct RequestOrchestrator {
    knowledge: Arc<KnowledgeStore>,
    client: Arc<dyn CompletionClient>,
    persona: PersonaProfile,
    assembler: PromptAssembler,
    generation: GenerationConfig,
    top_n: usize,
}

impl RequestOrchestrator {
    pub fn new(
        knowledge: Arc<KnowledgeStore>,
        client: Arc<dyn CompletionClient>,
        persona: PersonaProfile,
    ) -> Self {
        Self {
            knowledge,
            client,
            persona,
            assembler: PromptAssembler::default(),
            generation: GenerationConfig::unbounded_text(),
            top_n: DEFAULT_TOP_N,
        }
    }

    pub fn with_assembler(mut self, assembler: PromptAssembler) -> Self {
        self.assembler = assembler;
        self
    }

    pub fn with_top_n(mut self, top_n: usize) -> Self {
        self.top_n = top_n;
        self
    }

    /// Handles one question. Never panics and never returns an error: every
    /// failure past input validation is translated here into the fixed
    /// unavailability answer, with the diagnostic detail kept in the logs.
    pub async fn handle(&self, session: &SessionContext) -> ModelAnswer {
        let query = session.query.trim();
        if query.is_empty() {
            return ModelAnswer {
                text: EMPTY_QUERY_REPLY.to_string(),
                outcome: AskOutcome::EmptyQuery,
            };
        }

        let retrieved = retrieve(query, &self.knowledge, self.top_n);
        tracing::debug!(
            target: "mylead::orchestrator",
            matches = retrieved.len(),
            "knowledge retrieval complete"
        );

        let display_name = session.display_name.as_deref().unwrap_or("");
        let persona_text = self
            .persona
            .build_instructions(session.first_turn, display_name);
        let segments = self.assembler.assemble(&persona_text, &retrieved, query);

        let result = match self.client.complete(&segments, &self.generation).await {
            Ok(output) => aggregate(output).await,
            Err(e) => Err(e),
        };
        // An answer with no text at all is as useless to the caller as a
        // failed call; fold it into the same degraded path.
        let result = result.and_then(|text| {
            if text.is_empty() {
                Err(CompletionError::Malformed(
                    "completion produced no text".into(),
                ))
            } else {
                Ok(text)
            }
        });

        match result {
            Ok(text) => {
                tracing::info!(
                    target: "mylead::orchestrator",
                    model = self.client.model_id(),
                    chars = text.len(),
                    "answer generated"
                );
                ModelAnswer {
                    text,
                    outcome: AskOutcome::Answered,
                }
            }
            Err(e) => {
                tracing::error!(
                    target: "mylead::orchestrator",
                    model = self.client.model_id(),
                    error = %e,
                    "completion failed; returning degraded answer"
                );
                ModelAnswer {
                    text: self.persona.unavailable_message(),
                    outcome: AskOutcome::Unavailable,
                }
            }
        }
    }
}
