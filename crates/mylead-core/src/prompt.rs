//! Role-tagged prompt assembly.
//!
//! Segment order is the enforcement mechanism, not role tagging: the persona
//! text is always transmitted first and the user question last, so the scope
//! policy cannot be displaced by retrieved context.

/// Role tag for one prompt segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SegmentRole {
    System,
    User,
}

/// One role-tagged unit of text sent to the completion capability.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptSegment {
    pub role: SegmentRole,
    pub text: String,
}

impl PromptSegment {
    pub fn system(text: impl Into<String>) -> Self {
        Self {
            role: SegmentRole::System,
            text: text.into(),
        }
    }

    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: SegmentRole::User,
            text: text.into(),
        }
    }
}

const CONTEXT_BEGIN: &str = "--- BEGIN KNOWLEDGE BASE CONTEXT ---";
const CONTEXT_END: &str = "--- END KNOWLEDGE BASE CONTEXT ---";
const NO_CONTEXT_NOTE: &str = "No knowledge base entries matched this question. \
Answer from general guidance and suggest contacting a staff member when unsure.";

/// Assembles the ordered segment list for one completion call: persona,
/// then retrieved context (or a fixed no-context note), then the question.
pub struct PromptAssembler {
    /// Targets without a distinguished system role get the persona folded
    /// into a user-role segment; it still goes first.
    system_role_supported: bool,
}

impl PromptAssembler {
    pub fn new(system_role_supported: bool) -> Self {
        Self {
            system_role_supported,
        }
    }

    pub fn assemble(
        &self,
        persona: &str,
        retrieved: &[String],
        query: &str,
    ) -> Vec<PromptSegment> {
        let persona_segment = if self.system_role_supported {
            PromptSegment::system(persona)
        } else {
            PromptSegment::user(persona)
        };

        let context_segment = if retrieved.is_empty() {
            PromptSegment::user(NO_CONTEXT_NOTE)
        } else {
            let mut ctx = String::from(CONTEXT_BEGIN);
            for (i, item) in retrieved.iter().enumerate() {
                ctx.push_str(&format!("\nContext {}: {}", i + 1, item));
            }
            ctx.push('\n');
            ctx.push_str(CONTEXT_END);
            PromptSegment::user(ctx)
        };

        vec![persona_segment, context_segment, PromptSegment::user(query)]
    }
}

impl Default for PromptAssembler {
    fn default() -> Self {
        Self::new(true)
    }
}
