//! Hosted chat-completion client and answer synthesis.
//!
//! This crate owns the single outbound network boundary of the system: one
//! chat-completion call per question against an OpenAI-compatible endpoint
//! (Groq by default). The [`prompt`] module renders retrieved context and a
//! question into the fixed answer-synthesis template; [`GroqProvider`] sends
//! the rendered prompt. There is no retry logic and no conversation memory:
//! every call is single-shot, and failures propagate to the caller.

pub mod error;
pub mod groq;
pub mod http;
#[cfg(any(test, feature = "mock"))]
pub mod mock;
pub mod prompt;
pub mod provider;

pub use error::{LlmError, Result};
pub use groq::GroqProvider;
#[cfg(any(test, feature = "mock"))]
pub use mock::MockProvider;
pub use prompt::synthesize_answer;
pub use provider::{LlmProvider, Message, Role};
