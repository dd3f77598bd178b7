//! Anamnesis: an adaptive, multilingual clinical interview engine.
//!
//! The `interview` module holds the orchestration core. `llm` and
//! `knowledge` are the external collaborators it calls through traits, and
//! `document` is the file boundary for the stateless report path.

pub mod config;
pub mod document;
pub mod interview;
pub mod knowledge;
pub mod llm;
pub mod models;

pub use interview::{
    InterviewError, InterviewOrchestrator, InterviewServices, InterviewState, Report,
    SessionRegistry, TurnOutcome,
};
pub use models::Persona;

use tracing_subscriber::EnvFilter;

/// Install the global `tracing` subscriber. Honours `RUST_LOG`, otherwise
/// uses `config::default_log_filter()`. Safe to call more than once.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .with_writer(std::io::stderr)
        .try_init();
}
