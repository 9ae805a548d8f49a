//! Generative-model integration
//!
//! The orchestrator talks to the model through the [`TextModel`] trait so
//! tests can script responses without a network.

use async_trait::async_trait;
use thiserror::Error;

mod gemini;
pub mod sanitize;

pub use gemini::{GeminiClient, GenerationOptions};

/// Model-call errors
#[derive(Error, Debug)]
pub enum LlmError {
    #[error("missing GEMINI_API_KEY environment variable")]
    MissingApiKey,

    #[error("model request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("model API returned status {status}: {message}")]
    Api { status: u16, message: String },

    #[error("model response contained no generated text")]
    NoText,

    /// Scripted failure, used by test stubs.
    #[error("{0}")]
    Other(String),
}

/// A text-completion call: prompt in, free-form text out.
#[async_trait]
pub trait TextModel: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String, LlmError>;
}
