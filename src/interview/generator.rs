use std::sync::Arc;

use chrono::Local;

use super::prompt::{interview_system_prompt, question_prompt, report_prompt, report_system_prompt};
use super::sanitize::truncate_at_word_boundary;
use super::InterviewError;
use crate::knowledge::{assemble_passages, KnowledgeRetriever};
use crate::llm::LlmGenerate;
use crate::models::Persona;

const DEFAULT_TOP_K: usize = 4;
const DEFAULT_MAX_CONTEXT_CHARS: usize = 12_000;

/// Longest report material used as a retrieval query.
const MAX_REPORT_QUERY_CHARS: usize = 2_000;

/// What the generator is being asked to produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenerationTask {
    /// Next adaptive question, in the persona's voice.
    InterviewQuestion { persona: Persona, budget: u32 },
    /// Clinical report over an interview log or a document.
    ClinicalReport,
}

/// One generation call. All text is in the working language.
#[derive(Debug, Clone)]
pub struct GenerationRequest<'a> {
    pub task: GenerationTask,
    /// Instruction for this call; also drives retrieval for questions.
    pub query: &'a str,
    /// Interview history window, transcript, or document body.
    pub context: &'a str,
    /// Language the model is told to write in.
    pub language: &'a str,
    pub turn_index: u32,
}

/// Knowledge-grounded text generation used for questions and reports.
pub trait KnowledgeGenerator {
    fn generate(&self, request: &GenerationRequest<'_>) -> Result<String, InterviewError>;
}

/// Retrieve supporting passages, pack them into the prompt, call the model.
pub struct RagGenerator {
    llm: Arc<dyn LlmGenerate + Send + Sync>,
    retriever: Arc<dyn KnowledgeRetriever + Send + Sync>,
    top_k: usize,
    max_context_chars: usize,
}

impl RagGenerator {
    pub fn new(
        llm: Arc<dyn LlmGenerate + Send + Sync>,
        retriever: Arc<dyn KnowledgeRetriever + Send + Sync>,
    ) -> Self {
        Self {
            llm,
            retriever,
            top_k: DEFAULT_TOP_K,
            max_context_chars: DEFAULT_MAX_CONTEXT_CHARS,
        }
    }

    pub fn with_limits(mut self, top_k: usize, max_context_chars: usize) -> Self {
        self.top_k = top_k;
        self.max_context_chars = max_context_chars;
        self
    }

    /// Knowledge section for the prompt. Retrieval problems degrade to no
    /// context rather than failing the turn.
    fn knowledge_context(&self, query: &str) -> String {
        let passages = match self.retriever.retrieve(query, self.top_k) {
            Ok(passages) => passages,
            Err(e) => {
                tracing::warn!(error = %e, "Knowledge retrieval failed, generating without context");
                return String::new();
            }
        };

        let assembled = assemble_passages(&passages, self.max_context_chars);
        tracing::debug!(
            passages_retrieved = passages.len(),
            passages_used = assembled.passages_used,
            estimated_tokens = assembled.estimated_tokens,
            "Knowledge context assembled"
        );
        assembled.text
    }
}

impl KnowledgeGenerator for RagGenerator {
    fn generate(&self, request: &GenerationRequest<'_>) -> Result<String, InterviewError> {
        let (system, prompt) = match request.task {
            GenerationTask::InterviewQuestion { persona, budget } => {
                let context = self.knowledge_context(request.query);
                (
                    interview_system_prompt(persona, budget),
                    question_prompt(
                        &context,
                        request.context,
                        request.query,
                        request.turn_index,
                        request.language,
                    ),
                )
            }
            GenerationTask::ClinicalReport => {
                let retrieval_query =
                    truncate_at_word_boundary(request.context, MAX_REPORT_QUERY_CHARS);
                let context = self.knowledge_context(&retrieval_query);
                (
                    report_system_prompt(Local::now().date_naive()),
                    report_prompt(&context, request.context, request.query, request.language),
                )
            }
        };

        let output = self.llm.generate(&system, &prompt)?;
        let output = output.trim();
        if output.is_empty() {
            return Err(InterviewError::GenerationFailure("empty response".into()));
        }

        tracing::debug!(
            task = ?request.task,
            turn = request.turn_index,
            output_len = output.len(),
            "Generation complete"
        );
        Ok(output.to_string())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::knowledge::{EmptyKnowledge, KnowledgeError, Passage};
    use crate::llm::LlmError;

    struct MockLlm {
        reply: &'static str,
        calls: Mutex<Vec<(String, String)>>,
    }

    impl MockLlm {
        fn new(reply: &'static str) -> Arc<Self> {
            Arc::new(Self {
                reply,
                calls: Mutex::new(Vec::new()),
            })
        }

        fn last_call(&self) -> (String, String) {
            self.calls.lock().unwrap().last().cloned().unwrap()
        }
    }

    impl LlmGenerate for MockLlm {
        fn generate(&self, system: &str, prompt: &str) -> Result<String, LlmError> {
            self.calls
                .lock()
                .unwrap()
                .push((system.to_string(), prompt.to_string()));
            Ok(self.reply.to_string())
        }
    }

    struct StaticRetriever {
        queries: Mutex<Vec<String>>,
    }

    impl KnowledgeRetriever for StaticRetriever {
        fn retrieve(&self, query: &str, _top_k: usize) -> Result<Vec<Passage>, KnowledgeError> {
            self.queries.lock().unwrap().push(query.to_string());
            Ok(vec![Passage {
                id: "dsm-1".into(),
                source: Some("DSM-5".into()),
                content: "Insomnia disorder criteria.".into(),
                score: 0.9,
            }])
        }
    }

    struct BrokenRetriever;

    impl KnowledgeRetriever for BrokenRetriever {
        fn retrieve(&self, _query: &str, _top_k: usize) -> Result<Vec<Passage>, KnowledgeError> {
            Err(KnowledgeError::EmbeddingFailed("model not loaded".into()))
        }
    }

    fn question_request<'a>(query: &'a str, history: &'a str) -> GenerationRequest<'a> {
        GenerationRequest {
            task: GenerationTask::InterviewQuestion {
                persona: Persona::Sarah,
                budget: 10,
            },
            query,
            context: history,
            language: "English",
            turn_index: 6,
        }
    }

    #[test]
    fn question_prompt_includes_knowledge_and_history() {
        let llm = MockLlm::new("  How long have you had trouble sleeping?\n");
        let retriever = Arc::new(StaticRetriever {
            queries: Mutex::new(Vec::new()),
        });
        let generator = RagGenerator::new(llm.clone(), retriever.clone());

        let out = generator
            .generate(&question_request("follow up on sleep", "A5: I sleep badly"))
            .unwrap();
        assert_eq!(out, "How long have you had trouble sleeping?");

        let (system, prompt) = llm.last_call();
        assert!(system.contains("You are Sarah"));
        assert!(prompt.contains("[DSM-5] Insomnia disorder criteria."));
        assert!(prompt.contains("A5: I sleep badly"));
        assert!(prompt.contains("Current question number: 6"));
        assert!(prompt.ends_with("Write your reply in English."));
        assert_eq!(
            retriever.queries.lock().unwrap().as_slice(),
            ["follow up on sleep"]
        );
    }

    #[test]
    fn retrieval_failure_degrades_to_no_context() {
        let llm = MockLlm::new("What worries you most?");
        let generator = RagGenerator::new(llm.clone(), Arc::new(BrokenRetriever));

        let out = generator
            .generate(&question_request("next", "A5: fine"))
            .unwrap();
        assert_eq!(out, "What worries you most?");
        assert!(!llm.last_call().1.contains("KNOWLEDGE_BASE"));
    }

    #[test]
    fn empty_output_is_a_generation_failure() {
        let generator = RagGenerator::new(MockLlm::new(" \n"), Arc::new(EmptyKnowledge));
        assert!(matches!(
            generator.generate(&question_request("next", "A5: fine")),
            Err(InterviewError::GenerationFailure(_))
        ));
    }

    #[test]
    fn report_uses_report_prompts_and_material_for_retrieval() {
        let llm = MockLlm::new("MAIN REPORT: ...");
        let retriever = Arc::new(StaticRetriever {
            queries: Mutex::new(Vec::new()),
        });
        let generator = RagGenerator::new(llm.clone(), retriever.clone());

        let request = GenerationRequest {
            task: GenerationTask::ClinicalReport,
            query: "Please provide a clinical report based on the following interview:",
            context: "A1: hello\nQ2: What is your name?\nA2: Dana",
            language: "Italian",
            turn_index: 2,
        };
        generator.generate(&request).unwrap();

        let (system, prompt) = llm.last_call();
        assert!(system.contains("clinical report"));
        assert!(prompt.contains("<SOURCE_MATERIAL>\nA1: hello"));
        assert!(prompt.ends_with("Write your reply in Italian."));
        assert_eq!(
            retriever.queries.lock().unwrap().as_slice(),
            ["A1: hello\nQ2: What is your name?\nA2: Dana"]
        );
    }

    #[test]
    fn backend_error_propagates() {
        struct DownLlm;
        impl LlmGenerate for DownLlm {
            fn generate(&self, _system: &str, _prompt: &str) -> Result<String, LlmError> {
                Err(LlmError::OllamaConnection("http://localhost:11434".into()))
            }
        }
        let generator = RagGenerator::new(Arc::new(DownLlm), Arc::new(EmptyKnowledge));
        let err = generator
            .generate(&question_request("next", "A5: fine"))
            .unwrap_err();
        assert!(err.to_string().contains("Ollama is not running"));
    }
}
