use chrono::{Local, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::models::{QuestionOrigin, ReportSource};

/// Canonical language of history, prompts and generation context.
pub const WORKING_LANGUAGE: &str = "English";

/// Intake questions asked at indices 1–4 regardless of persona or language.
pub const FIXED_QUESTIONS: [&str; 4] = [
    "What is your name?",
    "What is your age?",
    "Where do you live?",
    "What is your current occupation?",
];

/// A summary is taken whenever the question index is a multiple of this.
pub const SUMMARY_INTERVAL: u32 = 5;

pub const CLOSING_STATEMENT: &str = "Thank you for your responses. I will now prepare a report.";
pub const END_OF_SESSION_MESSAGE: &str = "The interview has been ended by the user.";
pub const FALLBACK_QUESTION: &str = "Could you provide more details on your current situation?";
pub const FALLBACK_RETRY_QUESTION: &str = "Can you tell me something new about your experience?";
pub const REPORT_FAILURE_MESSAGE: &str =
    "Unable to generate report due to insufficient information.";
pub const INSUFFICIENT_INFORMATION_MESSAGE: &str = "Insufficient information: the material gathered \
so far is too limited to support a clinical assessment. No diagnosis, rating or interpretation \
is provided. A longer interview or a more detailed document is needed.";

/// One entry of the interview log, in strict turn order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum HistoryEntry {
    Answer { turn: u32, text: String },
    Question { turn: u32, text: String },
    Summary { turn: u32, text: String },
}

impl HistoryEntry {
    pub fn turn(&self) -> u32 {
        match self {
            Self::Answer { turn, .. } | Self::Question { turn, .. } | Self::Summary { turn, .. } => {
                *turn
            }
        }
    }

    pub fn text(&self) -> &str {
        match self {
            Self::Answer { text, .. } | Self::Question { text, .. } | Self::Summary { text, .. } => {
                text
            }
        }
    }

    pub fn is_summary(&self) -> bool {
        matches!(self, Self::Summary { .. })
    }

    /// Line used in the canonical log (`A3: ...`, `Q4: ...`, `Summary at Q5: ...`).
    pub fn render(&self) -> String {
        match self {
            Self::Answer { turn, text } => format!("A{turn}: {text}"),
            Self::Question { turn, text } => format!("Q{turn}: {text}"),
            Self::Summary { turn, text } => format!("Summary at Q{turn}: {text}"),
        }
    }
}

/// Join entries into the newline-separated log handed to the generator.
pub fn render_entries<'a, I>(entries: I) -> String
where
    I: IntoIterator<Item = &'a HistoryEntry>,
{
    entries
        .into_iter()
        .map(HistoryEntry::render)
        .collect::<Vec<_>>()
        .join("\n")
}

/// A question (or the closing statement) presented to the patient.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Question {
    /// 1-based; equals the turn count after the answer that preceded it.
    pub index: u32,
    pub origin: QuestionOrigin,
    pub text_canonical: String,
    pub text_localized: String,
}

impl Question {
    pub fn is_closing(&self) -> bool {
        self.origin == QuestionOrigin::Closing
    }
}

/// Structured clinical report. Created once, never modified.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    pub body: String,
    pub language: String,
    pub source: ReportSource,
    pub generated_at: NaiveDateTime,
}

impl Report {
    pub fn new(body: String, language: &str, source: ReportSource) -> Self {
        Self {
            body,
            language: language.to_string(),
            source,
            generated_at: Local::now().naive_local(),
        }
    }
}

/// Turn state machine. `Completed` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InterviewState {
    AwaitingAnswer(u32),
    Completed,
}

/// What `submit_answer` hands back to the UI layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TurnOutcome {
    pub question: Question,
    pub is_complete: bool,
}

impl TurnOutcome {
    /// Localized question or closing text.
    pub fn text(&self) -> &str {
        &self.question.text_localized
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entries_render_in_canonical_form() {
        let entries = vec![
            HistoryEntry::Answer { turn: 1, text: "Hello".into() },
            HistoryEntry::Question { turn: 2, text: "What is your name?".into() },
            HistoryEntry::Summary { turn: 5, text: "Patient is Dana.".into() },
        ];
        assert_eq!(
            render_entries(&entries),
            "A1: Hello\nQ2: What is your name?\nSummary at Q5: Patient is Dana."
        );
    }

    #[test]
    fn entry_accessors() {
        let entry = HistoryEntry::Summary { turn: 10, text: "Recap".into() };
        assert_eq!(entry.turn(), 10);
        assert_eq!(entry.text(), "Recap");
        assert!(entry.is_summary());
    }

    #[test]
    fn fixed_questions_are_the_intake_four() {
        assert_eq!(FIXED_QUESTIONS[0], "What is your name?");
        assert_eq!(FIXED_QUESTIONS[3], "What is your current occupation?");
    }

    #[test]
    fn history_entry_serializes_with_kind_tag() {
        let json = serde_json::to_value(HistoryEntry::Answer { turn: 3, text: "Rome".into() }).unwrap();
        assert_eq!(json["kind"], "answer");
        assert_eq!(json["turn"], 3);
    }

    #[test]
    fn insufficient_message_rules_out_diagnosis() {
        assert!(INSUFFICIENT_INFORMATION_MESSAGE.starts_with("Insufficient information"));
        assert!(INSUFFICIENT_INFORMATION_MESSAGE.contains("No diagnosis"));
    }
}
