use std::sync::Arc;

use super::generator::{KnowledgeGenerator, RagGenerator};
use super::planner::QuestionPlanner;
use super::prompt::initial_message;
use super::report::ReportSynthesizer;
use super::sanitize::sanitize_answer;
use super::session::InterviewSession;
use super::translate::Translator;
use super::types::{InterviewState, Report, TurnOutcome, END_OF_SESSION_MESSAGE, WORKING_LANGUAGE};
use super::InterviewError;
use crate::config::{is_supported_language, InterviewConfig};
use crate::knowledge::{EmptyKnowledge, KnowledgeIndex, KnowledgeRetriever, VectorRetriever};
use crate::llm::{LlmGenerate, OllamaClient, OllamaEmbedder, OllamaGenerator};
use crate::models::Persona;

/// Shared collaborators handed to every orchestrator.
#[derive(Clone)]
pub struct InterviewServices {
    pub generator: Arc<dyn KnowledgeGenerator + Send + Sync>,
    /// Raw model used for translation and rolling summaries.
    pub llm: Arc<dyn LlmGenerate + Send + Sync>,
    pub max_duplicate_retries: usize,
    pub document_char_limit: usize,
}

impl InterviewServices {
    pub fn new(
        generator: Arc<dyn KnowledgeGenerator + Send + Sync>,
        llm: Arc<dyn LlmGenerate + Send + Sync>,
    ) -> Self {
        let defaults = InterviewConfig::default();
        Self {
            generator,
            llm,
            max_duplicate_retries: defaults.max_duplicate_retries,
            document_char_limit: defaults.document_char_limit,
        }
    }

    /// Wire the Ollama backend and, when configured, the knowledge index.
    ///
    /// The model is not checked here; an unreachable Ollama surfaces as
    /// fallback texts during the interview.
    pub fn from_config(config: &InterviewConfig) -> Result<Self, InterviewError> {
        let client = OllamaClient::from_config(config)?;
        let llm: Arc<dyn LlmGenerate + Send + Sync> = Arc::new(OllamaGenerator::new(
            client.clone(),
            &config.model,
            config.temperature,
        ));

        let retriever: Arc<dyn KnowledgeRetriever + Send + Sync> = match &config.knowledge_index {
            Some(path) => {
                let index = KnowledgeIndex::load(path)?;
                let embedder = OllamaEmbedder::new(client, &config.embedding_model);
                Arc::new(VectorRetriever::new(embedder, index))
            }
            None => {
                tracing::info!("No knowledge index configured, generating without retrieval");
                Arc::new(EmptyKnowledge)
            }
        };

        let generator = RagGenerator::new(llm.clone(), retriever)
            .with_limits(config.retrieval_top_k, config.max_context_chars);

        Ok(Self {
            generator: Arc::new(generator),
            llm,
            max_duplicate_retries: config.max_duplicate_retries,
            document_char_limit: config.document_char_limit,
        })
    }
}

/// Drives one interview from greeting to report.
///
/// Each turn: sanitize → translate in → record answer → plan → translate out.
/// The answer that reaches the budget gets the closing statement and triggers
/// the report. Model failures never escape a turn.
pub struct InterviewOrchestrator {
    translator: Translator,
    planner: QuestionPlanner,
    synthesizer: ReportSynthesizer,
    session: Option<InterviewSession>,
    state: InterviewState,
    report: Option<Report>,
}

impl InterviewOrchestrator {
    pub fn new(services: &InterviewServices) -> Self {
        let translator = Translator::new(services.llm.clone());
        let planner = QuestionPlanner::new(services.generator.clone(), services.llm.clone())
            .with_max_duplicate_retries(services.max_duplicate_retries);
        let synthesizer = ReportSynthesizer::new(services.generator.clone(), translator.clone())
            .with_document_char_limit(services.document_char_limit);

        Self {
            translator,
            planner,
            synthesizer,
            session: None,
            state: InterviewState::AwaitingAnswer(0),
            report: None,
        }
    }

    pub fn state(&self) -> InterviewState {
        self.state
    }

    pub fn session(&self) -> Option<&InterviewSession> {
        self.session.as_ref()
    }

    /// Start a fresh session, discarding any previous one. Returns the
    /// greeting in the session language.
    pub fn start_session(
        &mut self,
        persona: Persona,
        language: &str,
        budget: u32,
    ) -> Result<String, InterviewError> {
        let session = InterviewSession::start(persona, language, budget)?;
        tracing::info!(
            session_id = %session.id(),
            persona = persona.as_str(),
            language = session.language(),
            budget,
            "Interview session started"
        );
        if !is_supported_language(session.language()) {
            tracing::info!(
                language = session.language(),
                "Session language is not in the vetted list, translating as free text"
            );
        }

        let greeting = initial_message(persona, session.language(), budget);
        let greeting = self
            .translator
            .translate(&greeting, session.language(), WORKING_LANGUAGE);

        self.session = Some(session);
        self.state = InterviewState::AwaitingAnswer(0);
        self.report = None;
        Ok(greeting)
    }

    /// Process one patient answer and return the next question, or the
    /// closing statement once the budget is reached.
    pub fn submit_answer(&mut self, raw_text: &str) -> Result<TurnOutcome, InterviewError> {
        let session = self.session.as_mut().ok_or(InterviewError::NoActiveSession)?;
        if self.state == InterviewState::Completed {
            return Err(InterviewError::SessionCompleted);
        }

        let sanitized = sanitize_answer(raw_text);
        let canonical = self
            .translator
            .translate(&sanitized.text, WORKING_LANGUAGE, session.language());
        let turn = session.record_answer(&canonical);

        let mut question = self.planner.plan_next(session);
        question.text_localized =
            self.translator
                .translate(&question.text_canonical, session.language(), WORKING_LANGUAGE);

        if question.is_closing() {
            let report = self.synthesizer.from_session(session);
            tracing::info!(
                session_id = %session.id(),
                turns = turn,
                "Interview completed, report ready"
            );
            self.report = Some(report);
            self.state = InterviewState::Completed;
            return Ok(TurnOutcome {
                question,
                is_complete: true,
            });
        }

        session.record_question(&question.text_canonical);
        self.state = InterviewState::AwaitingAnswer(turn);
        tracing::debug!(
            session_id = %session.id(),
            turn,
            origin = question.origin.as_str(),
            "Next question planned"
        );

        Ok(TurnOutcome {
            question,
            is_complete: false,
        })
    }

    /// End the interview early. No report is produced; the localized
    /// end-of-session message is returned.
    pub fn end_session(&mut self) -> Result<String, InterviewError> {
        let session = self.session.as_ref().ok_or(InterviewError::NoActiveSession)?;
        if self.state != InterviewState::Completed {
            tracing::info!(
                session_id = %session.id(),
                turns = session.turn_count(),
                "Interview ended by user"
            );
        }
        self.state = InterviewState::Completed;

        Ok(self
            .translator
            .translate(END_OF_SESSION_MESSAGE, session.language(), WORKING_LANGUAGE))
    }

    pub fn get_report(&self) -> Result<&Report, InterviewError> {
        if self.session.is_none() {
            return Err(InterviewError::NoActiveSession);
        }
        self.report.as_ref().ok_or(InterviewError::ReportNotReady)
    }

    /// Report from an external document. Independent of any session.
    pub fn generate_report_from_document(&self, raw_text: &str, language: &str) -> Report {
        self.synthesizer.from_document(raw_text, language)
    }
}
