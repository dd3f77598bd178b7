//! Text-generation seam shared by the translator, the summariser and the
//! retrieval generator, plus the local Ollama backend.

pub mod ollama;

pub use ollama::{OllamaClient, OllamaEmbedder, OllamaGenerator};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum LlmError {
    #[error("Ollama is not running at {0}")]
    OllamaConnection(String),

    #[error("Ollama returned error (status {status}): {body}")]
    OllamaError { status: u16, body: String },

    #[error("HTTP client error: {0}")]
    HttpClient(String),

    #[error("Response parsing error: {0}")]
    ResponseParsing(String),

    #[error("Model returned an empty response")]
    EmptyResponse,
}

/// Trait for raw LLM text generation.
pub trait LlmGenerate {
    fn generate(&self, system: &str, prompt: &str) -> Result<String, LlmError>;
}
