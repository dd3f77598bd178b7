use std::sync::Arc;

use super::prompt::{translation_prompt, TRANSLATION_SYSTEM_PROMPT};
use super::InterviewError;
use crate::llm::LlmGenerate;

/// Bidirectional translation between a session language and the working
/// language. Never fails: any backend error returns the input unchanged.
#[derive(Clone)]
pub struct Translator {
    llm: Arc<dyn LlmGenerate + Send + Sync>,
}

impl Translator {
    pub fn new(llm: Arc<dyn LlmGenerate + Send + Sync>) -> Self {
        Self { llm }
    }

    /// Translate `text` from `source_language` to `target_language`.
    pub fn translate(&self, text: &str, target_language: &str, source_language: &str) -> String {
        if same_language(target_language, source_language) || text.trim().is_empty() {
            return text.to_string();
        }

        match self.try_translate(text, target_language, source_language) {
            Ok(translated) => translated,
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    from = source_language,
                    to = target_language,
                    "Translation unavailable, passing text through"
                );
                text.to_string()
            }
        }
    }

    fn try_translate(
        &self,
        text: &str,
        target_language: &str,
        source_language: &str,
    ) -> Result<String, InterviewError> {
        let prompt = translation_prompt(text, source_language, target_language);
        let translated = self
            .llm
            .generate(TRANSLATION_SYSTEM_PROMPT, &prompt)
            .map_err(|e| InterviewError::TranslationFailure(e.to_string()))?;

        let translated = translated.trim();
        if translated.is_empty() {
            return Err(InterviewError::TranslationFailure(
                "empty translation".into(),
            ));
        }
        Ok(translated.to_string())
    }
}

/// Case-insensitive language comparison, Unicode-aware.
pub fn same_language(a: &str, b: &str) -> bool {
    a.trim().to_lowercase() == b.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::llm::LlmError;

    /// Prefixes the target language so tests can see a translation happened.
    struct TaggingLlm {
        calls: AtomicUsize,
    }

    impl TaggingLlm {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicUsize::new(0),
            })
        }
    }

    impl LlmGenerate for TaggingLlm {
        fn generate(&self, _system: &str, prompt: &str) -> Result<String, LlmError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let (head, text) = prompt.split_once(": ").unwrap();
            let target = head.rsplit(' ').next().unwrap();
            Ok(format!("[{target}] {text}"))
        }
    }

    struct FailingLlm;

    impl LlmGenerate for FailingLlm {
        fn generate(&self, _system: &str, _prompt: &str) -> Result<String, LlmError> {
            Err(LlmError::OllamaConnection("http://localhost:11434".into()))
        }
    }

    struct BlankLlm;

    impl LlmGenerate for BlankLlm {
        fn generate(&self, _system: &str, _prompt: &str) -> Result<String, LlmError> {
            Ok("   ".into())
        }
    }

    #[test]
    fn identity_when_languages_match_ignoring_case() {
        let llm = TaggingLlm::new();
        let translator = Translator::new(llm.clone());
        for text in ["Hello", "", "¿Dónde vives?", "A1: x\nQ2: y"] {
            assert_eq!(translator.translate(text, "english", "English"), text);
            assert_eq!(translator.translate(text, " SPANISH", "spanish "), text);
            assert_eq!(translator.translate(text, "ESPAÑOL", "español"), text);
            assert_eq!(translator.translate(text, "Français", "FRANÇAIS"), text);
        }
        assert_eq!(llm.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn different_languages_call_the_model() {
        let llm = TaggingLlm::new();
        let translator = Translator::new(llm.clone());
        let out = translator.translate("Where do you live?", "French", "English");
        assert_eq!(out, "[French] Where do you live?");
        assert_eq!(llm.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn failure_passes_text_through() {
        let translator = Translator::new(Arc::new(FailingLlm));
        assert_eq!(
            translator.translate("What is your age?", "German", "English"),
            "What is your age?"
        );
    }

    #[test]
    fn blank_translation_passes_text_through() {
        let translator = Translator::new(Arc::new(BlankLlm));
        assert_eq!(translator.translate("Tengo 34 años", "English", "Spanish"), "Tengo 34 años");
    }

    #[test]
    fn whitespace_only_text_is_not_sent() {
        let llm = TaggingLlm::new();
        let translator = Translator::new(llm.clone());
        assert_eq!(translator.translate("  ", "Hindi", "English"), "  ");
        assert_eq!(llm.calls.load(Ordering::SeqCst), 0);
    }
}
