//! Read-only access to the pre-built clinical knowledge index.
//!
//! Building the index is out of scope; this module loads it, embeds the
//! query and returns the closest passages.

pub mod context;
pub mod index;

pub use context::{assemble_passages, AssembledPassages};
pub use index::{EmptyKnowledge, IndexEntry, KnowledgeIndex, VectorRetriever};

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum KnowledgeError {
    #[error("Embedding generation failed: {0}")]
    EmbeddingFailed(String),

    #[error("Knowledge index is invalid: {0}")]
    InvalidIndex(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),
}

/// A passage returned by the retriever, with its similarity score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Passage {
    pub id: String,
    pub source: Option<String>,
    pub content: String,
    pub score: f32,
}

/// Turns text into the vector space of the index.
pub trait EmbeddingModel {
    fn embed(&self, text: &str) -> Result<Vec<f32>, KnowledgeError>;
}

/// Returns supporting passages for a query.
pub trait KnowledgeRetriever {
    fn retrieve(&self, query: &str, top_k: usize) -> Result<Vec<Passage>, KnowledgeError>;
}
