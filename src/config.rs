use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::Persona;

/// Application-level constants
pub const APP_NAME: &str = "Anamnesis";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Languages offered to the patient. Other values are accepted but not vetted.
pub const SUPPORTED_LANGUAGES: &[&str] = &["English", "Spanish", "French", "German", "Italian", "Hindi"];

/// Question budgets offered by the CLI.
pub const MIN_OFFERED_BUDGET: u32 = 10;
pub const MAX_OFFERED_BUDGET: u32 = 25;

const ENV_OLLAMA_URL: &str = "ANAMNESIS_OLLAMA_URL";
const ENV_MODEL: &str = "ANAMNESIS_MODEL";
const ENV_KNOWLEDGE_INDEX: &str = "ANAMNESIS_KNOWLEDGE_INDEX";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("I/O error reading config: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config file is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid config value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },
}

/// Get the application data directory (~/.anamnesis/)
pub fn app_data_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join(".anamnesis")
}

/// Location of the optional JSON config file.
pub fn config_path() -> PathBuf {
    app_data_dir().join("config.json")
}

/// Filter used when `RUST_LOG` is not set.
pub fn default_log_filter() -> &'static str {
    "anamnesis=info,warn"
}

/// Runtime settings for the interview engine and its collaborators.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InterviewConfig {
    pub ollama_url: String,
    pub model: String,
    pub embedding_model: String,
    pub timeout_secs: u64,
    pub temperature: f32,
    pub default_language: String,
    pub default_persona: Persona,
    pub default_budget: u32,
    /// Extra generations allowed when a candidate question repeats an earlier one.
    pub max_duplicate_retries: usize,
    pub retrieval_top_k: usize,
    pub max_context_chars: usize,
    pub document_char_limit: usize,
    pub knowledge_index: Option<PathBuf>,
}

impl Default for InterviewConfig {
    fn default() -> Self {
        Self {
            ollama_url: "http://localhost:11434".into(),
            model: "medgemma".into(),
            embedding_model: "nomic-embed-text".into(),
            timeout_secs: 300,
            temperature: 0.5,
            default_language: "English".into(),
            default_persona: Persona::Sarah,
            default_budget: 10,
            max_duplicate_retries: 3,
            retrieval_top_k: 4,
            max_context_chars: 12_000,
            document_char_limit: 100_000,
            knowledge_index: None,
        }
    }
}

impl InterviewConfig {
    /// Load from the default config path, then apply environment overrides.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = Self::load_from(&config_path())?;
        config.apply_env_overrides(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// Read a config file. A missing file yields the defaults.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "No config file, using defaults");
            return Ok(Self::default());
        }
        let raw = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&raw)?;
        tracing::info!(path = %path.display(), "Loaded interview config");
        Ok(config)
    }

    /// Apply `ANAMNESIS_*` overrides. The lookup is injected so tests avoid
    /// touching the process environment.
    pub fn apply_env_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup(ENV_OLLAMA_URL).filter(|v| !v.trim().is_empty()) {
            self.ollama_url = url;
        }
        if let Some(model) = lookup(ENV_MODEL).filter(|v| !v.trim().is_empty()) {
            self.model = model;
        }
        if let Some(index) = lookup(ENV_KNOWLEDGE_INDEX).filter(|v| !v.trim().is_empty()) {
            self.knowledge_index = Some(PathBuf::from(index));
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.default_budget == 0 {
            return Err(ConfigError::InvalidValue {
                field: "default_budget",
                reason: "must be at least 1".into(),
            });
        }
        if self.timeout_secs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "timeout_secs",
                reason: "must be positive".into(),
            });
        }
        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(ConfigError::InvalidValue {
                field: "temperature",
                reason: format!("{} is outside 0.0..=2.0", self.temperature),
            });
        }
        Ok(())
    }
}

/// Whether `language` is one of the vetted session languages (case-insensitive).
pub fn is_supported_language(language: &str) -> bool {
    let language = language.trim().to_lowercase();
    SUPPORTED_LANGUAGES
        .iter()
        .any(|l| l.to_lowercase() == language)
}
