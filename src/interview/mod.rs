//! Interview orchestration engine.
//!
//! One user turn runs translate-in → record answer → plan next question →
//! translate-out, and the final turn drives report synthesis. Every call to
//! an external model degrades to a fixed text so a session always reaches
//! completion.

pub mod types;
pub mod sanitize;
pub mod prompt;
pub mod session;
pub mod translate;
pub mod summarize;
pub mod generator;
pub mod planner;
pub mod report;
pub mod orchestrator;
pub mod registry;

pub use generator::{GenerationRequest, GenerationTask, KnowledgeGenerator, RagGenerator};
pub use orchestrator::{InterviewOrchestrator, InterviewServices};
pub use planner::QuestionPlanner;
pub use registry::SessionRegistry;
pub use report::ReportSynthesizer;
pub use session::InterviewSession;
pub use translate::Translator;
pub use types::*;

use thiserror::Error;
use uuid::Uuid;

use crate::knowledge::KnowledgeError;
use crate::llm::LlmError;

#[derive(Error, Debug)]
pub enum InterviewError {
    #[error("No interview session has been started")]
    NoActiveSession,

    #[error("The interview session is already completed")]
    SessionCompleted,

    #[error("The report is not available until the interview is completed")]
    ReportNotReady,

    #[error("Question budget must be at least 1 (got {0})")]
    InvalidBudget(u32),

    #[error("Interview session not found: {0}")]
    SessionNotFound(Uuid),

    #[error("Session lock poisoned")]
    LockPoisoned,

    #[error("Translation failed: {0}")]
    TranslationFailure(String),

    #[error("Generation failed: {0}")]
    GenerationFailure(String),

    #[error("Knowledge retrieval failed: {0}")]
    RetrievalFailure(String),
}

impl From<LlmError> for InterviewError {
    fn from(e: LlmError) -> Self {
        Self::GenerationFailure(e.to_string())
    }
}

impl From<KnowledgeError> for InterviewError {
    fn from(e: KnowledgeError) -> Self {
        Self::RetrievalFailure(e.to_string())
    }
}
