use std::sync::Arc;

use super::generator::{GenerationRequest, GenerationTask, KnowledgeGenerator};
use super::prompt::{duplicate_retry_query, question_query};
use super::session::InterviewSession;
use super::summarize::summarize;
use super::InterviewError;
use super::types::{
    Question, CLOSING_STATEMENT, FALLBACK_QUESTION, FALLBACK_RETRY_QUESTION, FIXED_QUESTIONS,
    WORKING_LANGUAGE,
};
use crate::llm::LlmGenerate;
use crate::models::QuestionOrigin;

/// Default ceiling on regenerations when a candidate repeats a past question.
pub const MAX_DUPLICATE_RETRIES: usize = 3;

/// Decides the next question for a session.
///
/// Closing beats fixed: once the answer count reaches the budget the closing
/// statement is emitted, even for budgets of four or less. Questions 1-4 are
/// the fixed intake set. Everything after is generated from the rolling
/// history window and checked against the canonical log for repeats.
pub struct QuestionPlanner {
    generator: Arc<dyn KnowledgeGenerator + Send + Sync>,
    llm: Arc<dyn LlmGenerate + Send + Sync>,
    max_duplicate_retries: usize,
}

impl QuestionPlanner {
    pub fn new(
        generator: Arc<dyn KnowledgeGenerator + Send + Sync>,
        llm: Arc<dyn LlmGenerate + Send + Sync>,
    ) -> Self {
        Self {
            generator,
            llm,
            max_duplicate_retries: MAX_DUPLICATE_RETRIES,
        }
    }

    pub fn with_max_duplicate_retries(mut self, retries: usize) -> Self {
        self.max_duplicate_retries = retries;
        self
    }

    /// Plan the question following the latest recorded answer.
    ///
    /// Text is in the working language; `text_localized` mirrors it until
    /// the caller translates. Takes the rolling summary first when the
    /// current turn is a summary boundary. Never fails.
    pub fn plan_next(&self, session: &mut InterviewSession) -> Question {
        let index = session.turn_count();

        if session.is_summary_turn() {
            self.take_summary(session);
        }

        if session.is_budget_reached() {
            tracing::info!(index, budget = session.question_budget(), "Question budget reached");
            return question(index, QuestionOrigin::Closing, CLOSING_STATEMENT.to_string());
        }

        if index <= FIXED_QUESTIONS.len() as u32 {
            let slot = index.saturating_sub(1) as usize;
            return question(index, QuestionOrigin::Fixed, FIXED_QUESTIONS[slot].to_string());
        }

        question(index, QuestionOrigin::Generated, self.generate_unique(session))
    }

    fn take_summary(&self, session: &mut InterviewSession) {
        let window = session.effective_history();
        match summarize(self.llm.as_ref(), &window, WORKING_LANGUAGE) {
            Ok(summary) => {
                tracing::debug!(turn = session.turn_count(), "Rolling summary recorded");
                session.record_summary(&summary);
            }
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    turn = session.turn_count(),
                    "Summary failed, keeping raw history window"
                );
            }
        }
    }

    fn generate_unique(&self, session: &InterviewSession) -> String {
        let index = session.turn_count();
        let history = session.effective_history();
        let last_answer = session.last_answer().unwrap_or_default().to_string();
        let task = GenerationTask::InterviewQuestion {
            persona: session.persona(),
            budget: session.question_budget(),
        };

        let query = question_query(&last_answer);
        let mut candidate = match self.request(task, &query, &history, session) {
            Ok(text) => text,
            Err(e) => {
                tracing::warn!(error = %e, index, "Question generation failed, using fallback");
                return FALLBACK_QUESTION.to_string();
            }
        };

        let mut retries = 0;
        while session.was_already_asked(&candidate) {
            if retries >= self.max_duplicate_retries {
                tracing::warn!(
                    index,
                    retries,
                    "Duplicate question retries exhausted, accepting last candidate"
                );
                break;
            }
            retries += 1;
            tracing::debug!(index, retries, "Candidate repeats an earlier question, regenerating");

            let query = duplicate_retry_query(&candidate, &last_answer);
            candidate = match self.request(task, &query, &history, session) {
                Ok(text) => text,
                Err(e) => {
                    tracing::warn!(error = %e, index, "Regeneration failed, using fallback");
                    FALLBACK_RETRY_QUESTION.to_string()
                }
            };
            if candidate == FALLBACK_RETRY_QUESTION {
                break;
            }
        }

        candidate
    }

    fn request(
        &self,
        task: GenerationTask,
        query: &str,
        history: &str,
        session: &InterviewSession,
    ) -> Result<String, InterviewError> {
        self.generator.generate(&GenerationRequest {
            task,
            query,
            context: history,
            language: WORKING_LANGUAGE,
            turn_index: session.turn_count(),
        })
    }
}

fn question(index: u32, origin: QuestionOrigin, text: String) -> Question {
    Question {
        index,
        origin,
        text_localized: text.clone(),
        text_canonical: text,
    }
}
