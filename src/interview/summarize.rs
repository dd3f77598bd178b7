use super::prompt::{summary_prompt, SUMMARY_SYSTEM_PROMPT};
use super::InterviewError;
use crate::llm::LlmGenerate;

/// Condense the rolling history window into a short summary.
///
/// Pure function of its inputs; the caller decides when a summary is due
/// and records the result.
pub fn summarize(
    llm: &dyn LlmGenerate,
    history_so_far: &str,
    language: &str,
) -> Result<String, InterviewError> {
    let prompt = summary_prompt(history_so_far, language);
    let summary = llm.generate(SUMMARY_SYSTEM_PROMPT, &prompt)?;

    let summary = summary.trim();
    if summary.is_empty() {
        return Err(InterviewError::GenerationFailure("empty summary".into()));
    }
    Ok(summary.to_string())
}
