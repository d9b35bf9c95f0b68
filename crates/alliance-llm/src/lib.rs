//! LLM access for the ALLIANCE OSTEO simulator.
//!
//! The simulated patient and the session evaluator both talk to a model
//! through [`LlmProvider`]. Production uses [`GeminiProvider`] wrapped in a
//! [`RetryWrapper`]; tests script replies with [`MockLlmProvider`].

pub mod error;
mod gemini;
mod json;
mod mock;
mod retry;
mod types;

use async_trait::async_trait;

pub use error::{LlmError, Result};
pub use gemini::{GeminiProvider, DEFAULT_GEMINI_BASE_URL};
pub use json::extract_json_object;
pub use mock::MockLlmProvider;
pub use retry::RetryWrapper;
pub use types::{CompletionRequest, CompletionResponse, Message, ResponseFormat, Role, TokenUsage};

/// A text-completion backend.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Runs one completion.
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse>;
}
