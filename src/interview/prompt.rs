use chrono::NaiveDate;

use super::types::FIXED_QUESTIONS;
use crate::models::Persona;

/// Opening message, in the working language, for a freshly started session.
pub fn initial_message(persona: Persona, language: &str, budget: u32) -> String {
    match persona {
        Persona::Sarah => format!(
            "Hello, I'm Sarah, an AI clinical psychologist, and I'll be conducting a clinical \
             interview with you in {language}. I will ask you a total of {budget} questions, \
             starting with four standard ones, followed by questions tailored to your responses. \
             Feel free to share as much or as little as you're comfortable with. Let's begin."
        ),
        Persona::Aaron => format!(
            "Hello, I'm Aaron, an AI clinical psychologist. I'll be conducting an interview with \
             you in {language}. We'll start with four standard questions, then I'll ask follow-ups \
             based on your answers, up to {budget} questions total. Let's get started."
        ),
    }
}

fn persona_preamble(persona: Persona) -> &'static str {
    match persona {
        Persona::Sarah => {
            "You are Sarah, an empathic and compassionate female psychologist conducting a \
             clinical interview."
        }
        Persona::Aaron => {
            "You are Aaron, a tough, impatient and not especially empathic male psychologist, \
             coach and mentor conducting a clinical interview."
        }
    }
}

/// System prompt for adaptive question generation.
pub fn interview_system_prompt(persona: Persona, budget: u32) -> String {
    let fixed: String = FIXED_QUESTIONS
        .iter()
        .enumerate()
        .map(|(i, q)| format!("- For question {}, ask: \"{}\"\n", i + 1, q))
        .collect();

    format!(
        "{preamble}\n\n\
         Use the context from the knowledge base and the interview history or summary to guide \
         your next question. Write in English; the patient-facing translation happens later.\n\
         {fixed}\
         - For questions 5 onward, ask one specific, detailed question based on the patient's \
         previous responses that has not been asked before.\n\
         - Every 5 questions a concise summary of the conversation replaces the full history; \
         build on it.\n\
         - Remember all previous answers and use them when relevant.\n\
         - If an answer is special, unusual or strange, ask about it to understand the patient's \
         personality or traits.\n\
         - The interview has {budget} questions in total.\n\
         - Reply with the question only, without preamble or commentary.",
        preamble = persona_preamble(persona),
    )
}

/// Instruction for a fresh adaptive question.
pub fn question_query(last_answer: &str) -> String {
    format!(
        "Based on the patient's last response: '{last_answer}', and considering the interview \
         history or summary above, ask a specific, detailed question that hasn't been asked before \
         and is relevant to the patient's situation. Ensure the question is unique."
    )
}

/// User prompt for one adaptive question.
pub fn question_prompt(
    context: &str,
    history: &str,
    instruction: &str,
    question_number: u32,
    language: &str,
) -> String {
    let mut prompt = String::new();

    if !context.is_empty() {
        prompt.push_str("<KNOWLEDGE_BASE>\n");
        prompt.push_str(context);
        prompt.push_str("</KNOWLEDGE_BASE>\n\n");
    }

    prompt.push_str("<INTERVIEW_HISTORY>\n");
    prompt.push_str(history);
    prompt.push_str("\n</INTERVIEW_HISTORY>\n\n");

    prompt.push_str(&format!("Current question number: {question_number}\n\n"));
    prompt.push_str(instruction);
    push_language_line(&mut prompt, language);

    prompt
}

/// Query text used when the previous candidate repeated an earlier question.
pub fn duplicate_retry_query(candidate: &str, last_answer: &str) -> String {
    format!(
        "The question '{candidate}' was already asked. Generate a new, unique question based on \
         the patient's last response: '{last_answer}' and the history or summary above."
    )
}

/// System prompt for the clinical report, date-stamped.
pub fn report_system_prompt(date: NaiveDate) -> String {
    format!(
        "You are a psychologist or psychiatrist preparing a clinical report in English.\n\
         Date to specify in the report: {date}\n\n\
         Prepare a brief clinical report based strictly on the information provided.\n\
         - Specify name, place of living and current occupation if available.\n\
         - Use only the terms, diagnostic criteria and classifications present in the knowledge \
         base context. Do not introduce external terminology.\n\
         - Be very careful with diagnoses: every diagnosis or interpretation needs facts, \
         foundations and explanations, and may quote the patient.\n\
         - When information about the patient is scarce, say so explicitly, keep ratings low and \
         do not provide a diagnosis or conclusions.\n\n\
         The report has two parts.\n\
         MAIN REPORT: observed symptoms, potential diagnoses (if applicable) and other relevant \
         clinical observations.\n\
         ADDITIONAL REPORT: overall clinical impression; dominant personality characteristics; \
         style of communication; main preoccupations; possible weaknesses or triggers; defense \
         mechanisms; likely reactions to stressful or unexpected events; behaviour in groups \
         versus alone; behaviour in intimate relationships; functioning at work; degree of \
         psychological health; what meeting this person is like; further assessments worth \
         doing; recommended type of treatment.\n\n\
         Then include the following rating blocks:\n\
         Big Five Traits (ratings of 0-10): Extraversion, Agreeableness, Conscientiousness, \
         Neuroticism, Openness, followed by an explanation.\n\
         Personality Disorders or Styles (ratings of 0-4): Depressed, Paranoid, \
         Schizoid-Schizotypal, Antisocial-Psychopathic, Borderline-Dysregulated, Narcissistic, \
         Anxious-Avoidant, Dependent-Victimized, Hysteric-Histrionic, Obsessional, followed by an \
         explanation.\n\
         Attachment Styles (ratings of 0-10): Secured, Anxious-Preoccupied, Dismissive-Avoidant, \
         Fearful-Avoidant, Avoidance, Positive view toward the Self, Positive view toward Others, \
         followed by an explanation."
    )
}

/// User prompt for the report. `material` is an interview log or a document body.
pub fn report_prompt(context: &str, material: &str, instruction: &str, language: &str) -> String {
    let mut prompt = String::new();

    if !context.is_empty() {
        prompt.push_str("<KNOWLEDGE_BASE>\n");
        prompt.push_str(context);
        prompt.push_str("</KNOWLEDGE_BASE>\n\n");
    }

    prompt.push_str("<SOURCE_MATERIAL>\n");
    prompt.push_str(material);
    prompt.push_str("\n</SOURCE_MATERIAL>\n\n");
    prompt.push_str(instruction);
    push_language_line(&mut prompt, language);

    prompt
}

fn push_language_line(prompt: &mut String, language: &str) {
    prompt.push_str(&format!("\n\nWrite your reply in {language}."));
}

pub const SUMMARY_SYSTEM_PROMPT: &str =
    "You condense clinical interview transcripts. Be concise, factual and neutral.";

pub fn summary_prompt(history: &str, language: &str) -> String {
    format!(
        "Summarize the following interview history concisely in {language}, focusing on key \
         points:\n{history}"
    )
}

pub const TRANSLATION_SYSTEM_PROMPT: &str =
    "You are a medical translator. Reply with the translation only.";

pub fn translation_prompt(text: &str, source_language: &str, target_language: &str) -> String {
    format!("Translate the following text from {source_language} to {target_language}: {text}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn greetings_mention_language_and_budget() {
        let sarah = initial_message(Persona::Sarah, "French", 12);
        assert!(sarah.contains("I'm Sarah"));
        assert!(sarah.contains("in French"));
        assert!(sarah.contains("12 questions"));

        let aaron = initial_message(Persona::Aaron, "Hindi", 15);
        assert!(aaron.contains("I'm Aaron"));
        assert!(aaron.contains("15 questions total"));
    }

    #[test]
    fn interview_prompt_lists_fixed_questions_in_order() {
        let prompt = interview_system_prompt(Persona::Sarah, 10);
        let positions: Vec<usize> = FIXED_QUESTIONS
            .iter()
            .map(|q| prompt.find(q).unwrap())
            .collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]));
        assert!(prompt.contains("10 questions in total"));
    }

    #[test]
    fn persona_changes_tone() {
        assert!(interview_system_prompt(Persona::Sarah, 10).contains("empathic and compassionate"));
        assert!(interview_system_prompt(Persona::Aaron, 10).contains("impatient"));
    }

    #[test]
    fn question_prompt_omits_empty_context() {
        let prompt = question_prompt("", "A1: hi", &question_query("hi"), 5, "English");
        assert!(!prompt.contains("KNOWLEDGE_BASE"));
        assert!(prompt.contains("A1: hi"));
        assert!(prompt.contains("Current question number: 5"));
        assert!(prompt.contains("last response: 'hi'"));
        assert!(prompt.ends_with("Write your reply in English."));
    }

    #[test]
    fn retry_query_quotes_repeated_candidate() {
        let query = duplicate_retry_query("How do you sleep?", "badly");
        assert!(query.starts_with("The question 'How do you sleep?' was already asked."));
        assert!(query.contains("'badly'"));
    }

    #[test]
    fn report_prompt_wraps_material() {
        let prompt = report_prompt("ctx", "A1: I'm Dana", "Write it.", "German");
        assert!(prompt.contains("<KNOWLEDGE_BASE>\nctx"));
        assert!(prompt.contains("<SOURCE_MATERIAL>\nA1: I'm Dana\n</SOURCE_MATERIAL>"));
        assert!(prompt.ends_with("Write it.\n\nWrite your reply in German."));
    }

    #[test]
    fn report_system_prompt_is_dated_and_cautious() {
        let date = NaiveDate::from_ymd_opt(2026, 3, 14).unwrap();
        let prompt = report_system_prompt(date);
        assert!(prompt.contains("2026-03-14"));
        assert!(prompt.contains("do not provide a diagnosis"));
        assert!(prompt.contains("Attachment Styles"));
    }

    #[test]
    fn translation_prompt_names_both_languages() {
        let prompt = translation_prompt("Hola", "Spanish", "English");
        assert_eq!(prompt, "Translate the following text from Spanish to English: Hola");
    }
}
