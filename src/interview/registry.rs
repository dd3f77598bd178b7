//! Concurrent interview sessions keyed by id.
//!
//! The map sits behind an `RwLock` and each orchestrator behind its own
//! `Mutex`, so turns in different sessions run in parallel while turns in
//! one session are serialized. The map lock is released before a turn
//! starts; model calls never hold it.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, RwLock};

use uuid::Uuid;

use super::orchestrator::{InterviewOrchestrator, InterviewServices};
use super::report::ReportSynthesizer;
use super::translate::Translator;
use super::types::{Report, TurnOutcome};
use super::InterviewError;
use crate::models::Persona;

type SharedOrchestrator = Arc<Mutex<InterviewOrchestrator>>;

pub struct SessionRegistry {
    services: InterviewServices,
    sessions: RwLock<HashMap<Uuid, SharedOrchestrator>>,
}

impl SessionRegistry {
    pub fn new(services: InterviewServices) -> Self {
        Self {
            services,
            sessions: RwLock::new(HashMap::new()),
        }
    }

    /// Start a session and register it. Returns its id and the greeting.
    pub fn open(
        &self,
        persona: Persona,
        language: &str,
        budget: u32,
    ) -> Result<(Uuid, String), InterviewError> {
        let mut orchestrator = InterviewOrchestrator::new(&self.services);
        let greeting = orchestrator.start_session(persona, language, budget)?;
        let id = orchestrator
            .session()
            .map(|s| s.id())
            .ok_or(InterviewError::NoActiveSession)?;

        let mut sessions = self
            .sessions
            .write()
            .map_err(|_| InterviewError::LockPoisoned)?;
        sessions.insert(id, Arc::new(Mutex::new(orchestrator)));
        tracing::debug!(session_id = %id, open_sessions = sessions.len(), "Session registered");
        Ok((id, greeting))
    }

    pub fn submit(&self, id: Uuid, raw_text: &str) -> Result<TurnOutcome, InterviewError> {
        let shared = self.get(id)?;
        let mut orchestrator = shared.lock().map_err(|_| InterviewError::LockPoisoned)?;
        orchestrator.submit_answer(raw_text)
    }

    pub fn end(&self, id: Uuid) -> Result<String, InterviewError> {
        let shared = self.get(id)?;
        let mut orchestrator = shared.lock().map_err(|_| InterviewError::LockPoisoned)?;
        orchestrator.end_session()
    }

    pub fn report(&self, id: Uuid) -> Result<Report, InterviewError> {
        let shared = self.get(id)?;
        let orchestrator = shared.lock().map_err(|_| InterviewError::LockPoisoned)?;
        orchestrator.get_report().cloned()
    }

    /// Drop a session. Returns whether it existed.
    pub fn close(&self, id: Uuid) -> Result<bool, InterviewError> {
        let mut sessions = self
            .sessions
            .write()
            .map_err(|_| InterviewError::LockPoisoned)?;
        Ok(sessions.remove(&id).is_some())
    }

    pub fn len(&self) -> usize {
        self.sessions.read().map(|s| s.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Stateless document report; no session is created.
    pub fn report_from_document(&self, raw_text: &str, language: &str) -> Report {
        let translator = Translator::new(self.services.llm.clone());
        ReportSynthesizer::new(self.services.generator.clone(), translator)
            .with_document_char_limit(self.services.document_char_limit)
            .from_document(raw_text, language)
    }

    fn get(&self, id: Uuid) -> Result<SharedOrchestrator, InterviewError> {
        let sessions = self
            .sessions
            .read()
            .map_err(|_| InterviewError::LockPoisoned)?;
        sessions
            .get(&id)
            .cloned()
            .ok_or(InterviewError::SessionNotFound(id))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::interview::generator::RagGenerator;
    use crate::interview::types::FIXED_QUESTIONS;
    use crate::knowledge::EmptyKnowledge;
    use crate::llm::{LlmError, LlmGenerate};

    struct EchoLlm {
        calls: AtomicUsize,
    }

    impl LlmGenerate for EchoLlm {
        fn generate(&self, system: &str, _prompt: &str) -> Result<String, LlmError> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            if system.contains("clinical report") {
                return Ok("MAIN REPORT".into());
            }
            Ok(format!("Generated {n}?"))
        }
    }

    fn registry() -> SessionRegistry {
        let llm = Arc::new(EchoLlm {
            calls: AtomicUsize::new(0),
        });
        let generator = RagGenerator::new(llm.clone(), Arc::new(EmptyKnowledge));
        SessionRegistry::new(InterviewServices::new(Arc::new(generator), llm))
    }

    #[test]
    fn sessions_are_isolated() {
        let registry = registry();
        let (a, _) = registry.open(Persona::Sarah, "English", 10).unwrap();
        let (b, _) = registry.open(Persona::Aaron, "English", 2).unwrap();
        assert_ne!(a, b);
        assert_eq!(registry.len(), 2);

        registry.submit(a, "hello from a").unwrap();
        registry.submit(a, "Alice").unwrap();
        let first_b = registry.submit(b, "hello from b").unwrap();
        assert_eq!(first_b.question.index, 1);
        assert_eq!(first_b.text(), FIXED_QUESTIONS[0]);

        let last_b = registry.submit(b, "Bob").unwrap();
        assert!(last_b.is_complete);
        assert_eq!(registry.report(b).unwrap().body, "MAIN REPORT");
        assert!(matches!(
            registry.report(a),
            Err(InterviewError::ReportNotReady)
        ));
    }

    #[test]
    fn unknown_id_is_not_found() {
        let registry = registry();
        let id = Uuid::new_v4();
        assert!(matches!(
            registry.submit(id, "hi"),
            Err(InterviewError::SessionNotFound(missing)) if missing == id
        ));
    }

    #[test]
    fn close_removes_session() {
        let registry = registry();
        let (id, _) = registry.open(Persona::Sarah, "English", 10).unwrap();
        assert!(registry.close(id).unwrap());
        assert!(!registry.close(id).unwrap());
        assert!(registry.is_empty());
        assert!(matches!(
            registry.end(id),
            Err(InterviewError::SessionNotFound(_))
        ));
    }

    #[test]
    fn concurrent_sessions_progress_independently() {
        let registry = registry();
        let ids: Vec<Uuid> = (0..4)
            .map(|_| registry.open(Persona::Sarah, "English", 6).unwrap().0)
            .collect();

        std::thread::scope(|scope| {
            for &id in &ids {
                let registry = &registry;
                scope.spawn(move || {
                    for i in 1..=6 {
                        registry.submit(id, &format!("answer {i}")).unwrap();
                    }
                });
            }
        });

        for id in ids {
            assert_eq!(registry.report(id).unwrap().body, "MAIN REPORT");
        }
    }

    #[test]
    fn document_report_opens_no_session() {
        let registry = registry();
        let report = registry.report_from_document("Too short.", "English");
        assert!(report.body.starts_with("Insufficient information"));
        assert!(registry.is_empty());
    }
}
