//! mylead-model: completion backends for the broker core.
//!
//! `ModelRouter` picks the backend at startup: the live Gemini client when
//! configured for it, otherwise the deterministic mock.

mod gemini;
mod mock;
mod router;

pub use gemini::GeminiModel;
pub use mock::MockModel;
pub use router::{LlmMode, ModelRouter};
