use std::sync::Arc;

use super::generator::{GenerationRequest, GenerationTask, KnowledgeGenerator};
use super::sanitize::sanitize_patient_input;
use super::session::InterviewSession;
use super::translate::Translator;
use super::types::{
    render_entries, HistoryEntry, Report, INSUFFICIENT_INFORMATION_MESSAGE, REPORT_FAILURE_MESSAGE,
    WORKING_LANGUAGE,
};
use crate::models::ReportSource;

/// Fewest recorded answers an interview needs before a report is attempted.
pub const MIN_INTERVIEW_ANSWERS: usize = 2;

/// Fewest words a document needs before a report is attempted.
pub const MIN_DOCUMENT_WORDS: usize = 20;

pub const DEFAULT_DOCUMENT_CHAR_LIMIT: usize = 100_000;

const INTERVIEW_INSTRUCTION: &str =
    "Please provide a clinical report based on the following interview:";
const DOCUMENT_INSTRUCTION: &str =
    "Please provide a clinical report based on the following content:";

/// Produces the clinical report for a finished interview or an uploaded
/// document. Always returns a report; failures become a fixed message.
pub struct ReportSynthesizer {
    generator: Arc<dyn KnowledgeGenerator + Send + Sync>,
    translator: Translator,
    document_char_limit: usize,
}

impl ReportSynthesizer {
    pub fn new(generator: Arc<dyn KnowledgeGenerator + Send + Sync>, translator: Translator) -> Self {
        Self {
            generator,
            translator,
            document_char_limit: DEFAULT_DOCUMENT_CHAR_LIMIT,
        }
    }

    pub fn with_document_char_limit(mut self, limit: usize) -> Self {
        self.document_char_limit = limit;
        self
    }

    /// Report over the full raw history. Summary entries are ignored so the
    /// report always reflects what the patient actually said.
    pub fn synthesize(&self, full_raw_history: &[HistoryEntry], language: &str) -> Report {
        let raw: Vec<&HistoryEntry> = full_raw_history.iter().filter(|e| !e.is_summary()).collect();
        let answers = raw
            .iter()
            .filter(|e| matches!(e, HistoryEntry::Answer { .. }))
            .count();

        if answers < MIN_INTERVIEW_ANSWERS {
            tracing::info!(answers, "Interview too short for a clinical report");
            return self.insufficient(language, ReportSource::Interview);
        }

        let transcript = render_entries(raw.iter().copied());
        let turn_index = raw.last().map(|e| e.turn()).unwrap_or(0);
        self.compose(
            &transcript,
            INTERVIEW_INSTRUCTION,
            turn_index,
            language,
            ReportSource::Interview,
        )
    }

    pub fn from_session(&self, session: &InterviewSession) -> Report {
        self.synthesize(session.history(), session.language())
    }

    /// Stateless report over an external document's text.
    pub fn from_document(&self, raw_text: &str, language: &str) -> Report {
        let sanitized = sanitize_patient_input(raw_text, self.document_char_limit);
        if sanitized.was_modified {
            tracing::debug!(modifications = ?sanitized.modifications, "Document text sanitized");
        }

        let words = sanitized.text.split_whitespace().count();
        if words < MIN_DOCUMENT_WORDS {
            tracing::info!(words, "Document too short for a clinical report");
            return self.insufficient(language, ReportSource::Document);
        }

        self.compose(
            &sanitized.text,
            DOCUMENT_INSTRUCTION,
            0,
            language,
            ReportSource::Document,
        )
    }

    fn compose(
        &self,
        material: &str,
        instruction: &str,
        turn_index: u32,
        language: &str,
        source: ReportSource,
    ) -> Report {
        let request = GenerationRequest {
            task: GenerationTask::ClinicalReport,
            query: instruction,
            context: material,
            language: WORKING_LANGUAGE,
            turn_index,
        };

        let body = match self.generator.generate(&request) {
            Ok(body) => {
                tracing::info!(?source, body_len = body.len(), "Clinical report generated");
                body
            }
            Err(e) => {
                tracing::warn!(error = %e, ?source, "Report generation failed");
                REPORT_FAILURE_MESSAGE.to_string()
            }
        };

        self.localized(&body, language, source)
    }

    fn insufficient(&self, language: &str, source: ReportSource) -> Report {
        self.localized(INSUFFICIENT_INFORMATION_MESSAGE, language, source)
    }

    fn localized(&self, body: &str, language: &str, source: ReportSource) -> Report {
        let body = self.translator.translate(body, language, WORKING_LANGUAGE);
        Report::new(body, language, source)
    }
}
