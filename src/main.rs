use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use thiserror::Error;

use anamnesis::config::{self, ConfigError, InterviewConfig};
use anamnesis::document::{self, DocumentError};
use anamnesis::llm::OllamaClient;
use anamnesis::{InterviewError, InterviewOrchestrator, InterviewServices, Persona};

const END_COMMAND: &str = "/end";

#[derive(Parser)]
#[command(name = "anamnesis", version)]
#[command(about = "Adaptive multilingual clinical interview and report generation", long_about = None)]
struct Cli {
    /// Config file to use instead of ~/.anamnesis/config.json
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run an interactive interview on stdin/stdout
    Interview {
        /// Interviewer persona (sarah or aaron)
        #[arg(long)]
        persona: Option<Persona>,

        /// Language the patient answers in
        #[arg(long)]
        language: Option<String>,

        /// Total number of questions, closing statement included
        #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
        questions: Option<u32>,

        /// Pre-built knowledge index (JSON)
        #[arg(long)]
        knowledge: Option<PathBuf>,
    },
    /// Produce a clinical report from a .txt or .md document
    Report {
        #[arg(long)]
        file: PathBuf,

        /// Language of the report
        #[arg(long)]
        language: Option<String>,

        /// Write the report body here instead of stdout
        #[arg(long)]
        output: Option<PathBuf>,

        /// Pre-built knowledge index (JSON)
        #[arg(long)]
        knowledge: Option<PathBuf>,
    },
}

#[derive(Error, Debug)]
enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Interview(#[from] InterviewError),

    #[error(transparent)]
    Document(#[from] DocumentError),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

fn main() -> ExitCode {
    anamnesis::init_tracing();
    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::debug!(error = ?e, "Command failed");
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), CliError> {
    let mut config = load_config(cli.config)?;
    tracing::info!("{} v{}", config::APP_NAME, config::APP_VERSION);

    match cli.command {
        Commands::Interview {
            persona,
            language,
            questions,
            knowledge,
        } => {
            if knowledge.is_some() {
                config.knowledge_index = knowledge;
            }
            let persona = persona.unwrap_or(config.default_persona);
            let language = language.unwrap_or_else(|| config.default_language.clone());
            let budget = questions.unwrap_or(config.default_budget);
            if !(config::MIN_OFFERED_BUDGET..=config::MAX_OFFERED_BUDGET).contains(&budget) {
                tracing::warn!(
                    budget,
                    "Question budget outside the usual {}-{} range",
                    config::MIN_OFFERED_BUDGET,
                    config::MAX_OFFERED_BUDGET
                );
            }
            run_interview(&config, persona, &language, budget)
        }
        Commands::Report {
            file,
            language,
            output,
            knowledge,
        } => {
            if knowledge.is_some() {
                config.knowledge_index = knowledge;
            }
            let language = language.unwrap_or_else(|| config.default_language.clone());
            run_document_report(&config, &file, &language, output)
        }
    }
}

fn load_config(path: Option<PathBuf>) -> Result<InterviewConfig, ConfigError> {
    match path {
        Some(path) => {
            let mut config = InterviewConfig::load_from(&path)?;
            config.apply_env_overrides(|key| std::env::var(key).ok());
            config.validate()?;
            Ok(config)
        }
        None => InterviewConfig::load(),
    }
}

fn run_interview(
    config: &InterviewConfig,
    persona: Persona,
    language: &str,
    budget: u32,
) -> Result<(), CliError> {
    warn_if_model_missing(config);
    let services = InterviewServices::from_config(config)?;
    let mut orchestrator = InterviewOrchestrator::new(&services);

    let greeting = orchestrator.start_session(persona, language, budget)?;
    println!("{}: {greeting}\n", persona.display_name());
    println!("(type {END_COMMAND} to stop the interview)\n");

    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();
    loop {
        print!("> ");
        io::stdout().flush()?;

        let Some(line) = lines.next().transpose()? else {
            let message = orchestrator.end_session()?;
            println!("\n{message}");
            return Ok(());
        };

        let answer = line.trim();
        if answer.is_empty() {
            continue;
        }
        if answer.eq_ignore_ascii_case(END_COMMAND) {
            let message = orchestrator.end_session()?;
            println!("{message}");
            return Ok(());
        }

        let outcome = orchestrator.submit_answer(answer)?;
        println!("\n{}: {}\n", persona.display_name(), outcome.text());

        if outcome.is_complete {
            let report = orchestrator.get_report()?;
            println!("──── Clinical report ({}) ────\n", report.generated_at.format("%Y-%m-%d %H:%M"));
            println!("{}", report.body);
            return Ok(());
        }
    }
}

fn run_document_report(
    config: &InterviewConfig,
    file: &std::path::Path,
    language: &str,
    output: Option<PathBuf>,
) -> Result<(), CliError> {
    let text = document::read_document(file)?;
    warn_if_model_missing(config);
    let services = InterviewServices::from_config(config)?;
    let report = InterviewOrchestrator::new(&services).generate_report_from_document(&text, language);

    match output {
        Some(path) => {
            std::fs::write(&path, &report.body)?;
            println!("Report written to {}", path.display());
        }
        None => println!("{}", report.body),
    }
    Ok(())
}

/// Check Ollama before starting. The interview still runs without it, on
/// fallback texts, so this only informs the user.
fn warn_if_model_missing(config: &InterviewConfig) {
    let available = OllamaClient::from_config(config).and_then(|c| c.is_model_available(&config.model));
    match available {
        Ok(true) => tracing::debug!(model = %config.model, "Model available"),
        Ok(false) => eprintln!(
            "Warning: model '{}' is not pulled in Ollama; questions and reports will use fallback texts.",
            config.model
        ),
        Err(e) => eprintln!("Warning: {e}; questions and reports will use fallback texts."),
    }
}
