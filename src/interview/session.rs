use chrono::{Local, NaiveDateTime};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::types::{render_entries, HistoryEntry, SUMMARY_INTERVAL};
use super::InterviewError;
use crate::models::Persona;

/// State of one interview: settings, turn counter and the append-only log.
///
/// Summaries are additive markers. The raw entries stay in place for the
/// final report; only generation context is cut at the latest summary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InterviewSession {
    id: Uuid,
    language: String,
    persona: Persona,
    question_budget: u32,
    turn_count: u32,
    history: Vec<HistoryEntry>,
    started_at: NaiveDateTime,
}

impl InterviewSession {
    /// Fresh session at turn 0 with an empty history.
    pub fn start(persona: Persona, language: &str, budget: u32) -> Result<Self, InterviewError> {
        if budget == 0 {
            return Err(InterviewError::InvalidBudget(budget));
        }
        Ok(Self {
            id: Uuid::new_v4(),
            language: language.trim().to_string(),
            persona,
            question_budget: budget,
            turn_count: 0,
            history: Vec::new(),
            started_at: Local::now().naive_local(),
        })
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn language(&self) -> &str {
        &self.language
    }

    pub fn persona(&self) -> Persona {
        self.persona
    }

    pub fn question_budget(&self) -> u32 {
        self.question_budget
    }

    pub fn turn_count(&self) -> u32 {
        self.turn_count
    }

    pub fn started_at(&self) -> NaiveDateTime {
        self.started_at
    }

    pub fn history(&self) -> &[HistoryEntry] {
        &self.history
    }

    pub fn is_budget_reached(&self) -> bool {
        self.turn_count >= self.question_budget
    }

    /// Whether the current turn is a summary boundary (5, 10, 15, ...).
    pub fn is_summary_turn(&self) -> bool {
        self.turn_count > 4 && self.turn_count % SUMMARY_INTERVAL == 0
    }

    /// Append the patient's (working-language) answer and advance the turn.
    pub fn record_answer(&mut self, text: &str) -> u32 {
        self.turn_count += 1;
        self.history.push(HistoryEntry::Answer {
            turn: self.turn_count,
            text: text.to_string(),
        });
        self.turn_count
    }

    /// Append the question that the next answer will respond to.
    ///
    /// Ignored once the budget is reached so the closing statement never
    /// enters the log. Returns whether the entry was recorded.
    pub fn record_question(&mut self, text: &str) -> bool {
        if self.is_budget_reached() {
            return false;
        }
        self.history.push(HistoryEntry::Question {
            turn: self.turn_count + 1,
            text: text.to_string(),
        });
        true
    }

    /// Append a summary taken at the current turn.
    pub fn record_summary(&mut self, text: &str) {
        self.history.push(HistoryEntry::Summary {
            turn: self.turn_count,
            text: text.to_string(),
        });
    }

    /// Entries from the latest summary (inclusive) to the end, or everything
    /// when no summary has been taken yet.
    pub fn entries_since_last_summary(&self) -> &[HistoryEntry] {
        let start = self
            .history
            .iter()
            .rposition(HistoryEntry::is_summary)
            .unwrap_or(0);
        &self.history[start..]
    }

    /// Generation context: the rolling window rendered as text.
    pub fn effective_history(&self) -> String {
        render_entries(self.entries_since_last_summary())
    }

    /// Full raw log, summaries excluded. Used for the final report.
    pub fn raw_transcript(&self) -> String {
        render_entries(self.history.iter().filter(|e| !e.is_summary()))
    }

    /// Every entry rendered, summaries included.
    pub fn canonical_log(&self) -> String {
        render_entries(&self.history)
    }

    pub fn answer_count(&self) -> usize {
        self.history
            .iter()
            .filter(|e| matches!(e, HistoryEntry::Answer { .. }))
            .count()
    }

    pub fn last_answer(&self) -> Option<&str> {
        self.history.iter().rev().find_map(|e| match e {
            HistoryEntry::Answer { text, .. } => Some(text.as_str()),
            _ => None,
        })
    }

    /// Non-repetition check: the candidate repeats an earlier question when
    /// the rendered questions contain `Q{n}: {candidate}` for any asked index.
    /// Answers and summaries are not scanned.
    pub fn was_already_asked(&self, candidate: &str) -> bool {
        let asked = render_entries(
            self.history
                .iter()
                .filter(|e| matches!(e, HistoryEntry::Question { .. })),
        );
        (1..=self.turn_count + 1).any(|num| asked.contains(&format!("Q{num}: {candidate}")))
    }
}
