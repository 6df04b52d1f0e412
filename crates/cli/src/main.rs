//! CLI tool that turns study documents into a multiple-choice quiz.

mod interactive;

use anyhow::{Context, Result};
use clap::Parser;
use quizzard_core::{
    list_dir, mcq_instruction, parse_quiz, query, ContentNormalizer, CorpusAggregator, Generator,
    Quiz, DEFAULT_QUESTION_COUNT,
};
use quizzard_docx::DocxParser;
use quizzard_gemini::client::DEFAULT_MODEL;
use quizzard_gemini::{GeminiClient, GeminiConfig};
use quizzard_pdf::PdfParser;
use quizzard_pptx::PptxParser;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Generate a quiz from PDF, DOCX and PPTX files and take it in the terminal.
#[derive(Parser, Debug)]
#[command(name = "quizzard")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Input documents or directories of documents
    #[arg(required = true)]
    input: Vec<PathBuf>,

    /// Number of questions to request
    #[arg(short = 'n', long, default_value_t = DEFAULT_QUESTION_COUNT)]
    questions: usize,

    /// Gemini API key
    #[arg(long, env = "GEMINI_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Gemini model name
    #[arg(long, env = "GEMINI_MODEL", default_value = DEFAULT_MODEL)]
    model: String,

    /// Override the Gemini API base URL
    #[arg(long)]
    endpoint: Option<String>,

    /// Request timeout in seconds
    #[arg(long, default_value = "120")]
    timeout_secs: u64,

    /// Read the model output from a file instead of calling Gemini
    #[arg(short, long)]
    response: Option<PathBuf>,

    /// Print the aggregated document text and exit
    #[arg(long)]
    print_corpus: bool,

    /// Print the parsed quiz as JSON and exit
    #[arg(long)]
    json: bool,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

/// Generator that replays a saved model response.
struct SavedResponse {
    text: String,
}

impl Generator for SavedResponse {
    fn generate(&self, _corpus: &str, _instruction: &str) -> quizzard_core::Result<Option<String>> {
        Ok(Some(self.text.clone()))
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    if args.verbose {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("debug")).init();
    } else {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    }

    let normalizer = ContentNormalizer::new()
        .with_extractor(PdfParser::new())
        .with_extractor(DocxParser::new())
        .with_extractor(PptxParser::new());
    let aggregator = CorpusAggregator::new(&normalizer);

    let paths = expand_inputs(&args.input)?;
    if args.verbose {
        eprintln!(
            "Reading {} file(s) as {}",
            paths.len(),
            format_list(&normalizer)
        );
    }

    let corpus = aggregator.aggregate(&paths);
    if args.verbose {
        eprintln!(
            "  Extracted {} bytes from {} document(s)",
            corpus.as_str().len(),
            corpus.sources().len()
        );
    }

    if args.print_corpus {
        println!("{}", corpus);
        return Ok(());
    }

    if corpus.is_empty() {
        eprintln!("No readable text found in the given documents");
        return Ok(());
    }

    let generator = build_generator(&args)?;
    let raw = query(
        generator.as_ref(),
        corpus.as_str(),
        &mcq_instruction(args.questions),
    );

    let quiz = parse_quiz(&raw);
    report_mismatches(&quiz);

    if args.json {
        println!("{}", serde_json::to_string_pretty(&quiz)?);
        return Ok(());
    }

    if quiz.is_empty() {
        println!("No quiz could be produced from the model output:");
        println!("{}", raw);
        return Ok(());
    }

    println!("Generated Quiz Content:\n");
    println!("{}", quiz);

    let stdin = io::stdin();
    let stdout = io::stdout();
    interactive::run_session(&quiz, stdin.lock(), stdout.lock())?;
    io::stdout().flush()?;

    Ok(())
}

/// Replace each directory argument by its entries, sorted by name.
fn expand_inputs(inputs: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let mut paths = Vec::new();
    for input in inputs {
        if input.is_dir() {
            let entries = list_dir(input)
                .with_context(|| format!("Failed to list {}", input.display()))?;
            paths.extend(entries);
        } else {
            paths.push(input.clone());
        }
    }
    Ok(paths)
}

/// Registered formats, e.g. "PDF/DOCX/PPTX".
fn format_list(normalizer: &ContentNormalizer) -> String {
    normalizer
        .supported_formats()
        .iter()
        .map(|format| format.to_string())
        .collect::<Vec<_>>()
        .join("/")
}

fn build_generator(args: &Args) -> Result<Box<dyn Generator>> {
    if let Some(path) = &args.response {
        let text = read_response(path)?;
        return Ok(Box::new(SavedResponse { text }));
    }

    let api_key = args
        .api_key
        .clone()
        .context("No API key: set GEMINI_API_KEY or pass --api-key (or use --response)")?;

    let mut config = GeminiConfig::new(api_key)
        .with_model(&args.model)
        .with_timeout(Duration::from_secs(args.timeout_secs));
    if let Some(endpoint) = &args.endpoint {
        config = config.with_endpoint(endpoint);
    }

    let client = GeminiClient::new(config).map_err(|e| anyhow::anyhow!("{}", e))?;
    Ok(Box::new(client))
}

fn read_response(path: &Path) -> Result<String> {
    fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))
}

fn report_mismatches(quiz: &Quiz) {
    for id in quiz.questions_without_answer() {
        log::warn!("Question {} has no answer in the answer key", id);
    }
    for id in quiz.answers_without_question() {
        log::warn!("Answer key entry {} has no matching question", id);
    }
}
