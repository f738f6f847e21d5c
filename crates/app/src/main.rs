use anyhow::Context;
use chrono::Utc;
use clap::{Parser, Subcommand};
use scheme_rag_core::{
    discover_pdf_files, split_sections, ApiKey, AssistantConfig, CharacterNgramEmbedder,
    Embedder, HttpEmbedder, LopdfExtractor, OpenRouterClient, SchemeAssistant,
    DEFAULT_EMBEDDING_DIMENSIONS,
};
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};
use url::Url;

type Assistant = SchemeAssistant<Arc<dyn Embedder>, OpenRouterClient>;

const EXIT_WORDS: [&str; 3] = ["exit", "quit", "stop"];

#[derive(Parser)]
#[command(name = "scheme-rag", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Folder scanned recursively for scheme PDFs
    #[arg(long, default_value = ".")]
    docs: PathBuf,

    /// API key for the chat-completion service
    #[arg(long, env = "OPENROUTER_API_KEY", hide_env_values = true, default_value = "")]
    api_key: String,

    /// Chat-completion endpoint URL
    #[arg(long, default_value = scheme_rag_core::chat::DEFAULT_CHAT_ENDPOINT)]
    chat_url: String,

    /// Model that writes the English answer
    #[arg(long, default_value = scheme_rag_core::config::DEFAULT_ANSWER_MODEL)]
    model: String,

    /// Model that translates each paragraph
    #[arg(long, default_value = scheme_rag_core::config::DEFAULT_TRANSLATION_MODEL)]
    translation_model: String,

    /// OpenAI-compatible embeddings endpoint; the local n-gram embedder is used when absent
    #[arg(long)]
    embedding_url: Option<String>,

    /// Model name sent to the embeddings endpoint
    #[arg(long, default_value = "all-MiniLM-L6-v2")]
    embedding_model: String,

    /// Vector size produced by the embedder
    #[arg(long, default_value_t = DEFAULT_EMBEDDING_DIMENSIONS)]
    embedding_dimensions: usize,

    /// Words per chunk
    #[arg(long, default_value_t = scheme_rag_core::chunking::DEFAULT_CHUNK_SIZE)]
    chunk_size: usize,

    /// Words shared by consecutive chunks
    #[arg(long, default_value_t = scheme_rag_core::chunking::DEFAULT_CHUNK_OVERLAP)]
    overlap: usize,

    /// Passages retrieved per question
    #[arg(long, default_value_t = scheme_rag_core::retriever::DEFAULT_TOP_K)]
    top_k: usize,

    /// Passages at or below this cosine similarity are ignored
    #[arg(long, default_value_t = scheme_rag_core::retriever::DEFAULT_MIN_SIMILARITY)]
    min_similarity: f32,

    /// Cap on context characters sent to the answer model
    #[arg(long)]
    context_char_budget: Option<usize>,

    /// Paragraph translations issued in parallel
    #[arg(long, default_value_t = 1)]
    translation_concurrency: usize,

    /// Per-request timeout in seconds
    #[arg(long, default_value_t = 60)]
    timeout_secs: u64,

    /// Retries for a failed chat request
    #[arg(long, default_value_t = 0)]
    max_retries: u32,
}

#[derive(Subcommand)]
enum Command {
    /// Answer a single question.
    Ask {
        /// Question about a welfare scheme
        #[arg(long)]
        query: String,
    },
    /// Ask questions interactively until exit, quit or stop.
    Chat,
}

impl Cli {
    fn assistant_config(&self) -> anyhow::Result<AssistantConfig> {
        let mut config = AssistantConfig::new(ApiKey::new(self.api_key.trim()))?;
        config.chunking.chunk_size = self.chunk_size;
        config.chunking.overlap = self.overlap;
        config.retrieval.top_k = self.top_k;
        config.retrieval.min_similarity = self.min_similarity;
        config.retrieval.context_char_budget = self.context_char_budget;
        config.generation.answer_model = self.model.clone();
        config.generation.translation_model = self.translation_model.clone();
        config.generation.translation_concurrency = self.translation_concurrency;
        config.endpoint.chat_endpoint = Url::parse(&self.chat_url)
            .with_context(|| format!("invalid --chat-url {}", self.chat_url))?;
        config.endpoint.timeout = Duration::from_secs(self.timeout_secs);
        config.endpoint.max_retries = self.max_retries;
        config.validate()?;
        Ok(config)
    }

    fn embedder(&self, config: &AssistantConfig) -> anyhow::Result<Arc<dyn Embedder>> {
        match &self.embedding_url {
            Some(endpoint) => {
                let endpoint = Url::parse(endpoint)
                    .with_context(|| format!("invalid --embedding-url {endpoint}"))?;
                let api_key = Some(self.api_key.trim().to_string()).filter(|key| !key.is_empty());
                let embedder = HttpEmbedder::new(
                    endpoint,
                    self.embedding_model.clone(),
                    api_key,
                    self.embedding_dimensions,
                    config.endpoint.timeout,
                )?;
                Ok(Arc::new(embedder))
            }
            None => Ok(Arc::new(CharacterNgramEmbedder {
                dimensions: self.embedding_dimensions,
            })),
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let app_version = env!("CARGO_PKG_VERSION");

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(fmt::layer())
        .init();

    let cli = Cli::parse();
    let config = cli.assistant_config()?;
    if config.endpoint.api_key.is_empty() {
        warn!("no API key configured; chat requests will be sent unauthenticated");
    }

    info!(
        version = app_version,
        started_at = %Utc::now().to_rfc3339(),
        "scheme-rag boot"
    );

    let embedder = cli.embedder(&config)?;
    let chat = OpenRouterClient::new(config.endpoint.clone())?;
    let assistant: Assistant = SchemeAssistant::new(&config, embedder, chat)?;

    load_documents(&assistant, &cli.docs).await?;

    match cli.command {
        Command::Ask { query } => {
            let response = assistant.chat(&query).await;
            print_response(&assistant, &response);
        }
        Command::Chat => {
            println!("Odisha E-Governance Assistant ready!");
            run_interactive(&assistant).await?;
        }
    }

    Ok(())
}

async fn load_documents(assistant: &Assistant, folder: &Path) -> anyhow::Result<()> {
    let files = discover_pdf_files(folder);
    if files.is_empty() {
        warn!(folder = %folder.display(), "no PDFs found; place scheme PDFs in the docs folder");
    }

    let report = assistant
        .rebuild_index(files.as_slice(), &LopdfExtractor)
        .await
        .context("failed to build the document index")?;

    for skipped in &report.skipped {
        warn!(path = %skipped.path.display(), reason = %skipped.reason, "skipped pdf");
    }

    if report.is_empty() {
        println!("0 chunks indexed; questions will not find any context");
    } else {
        println!(
            "Loaded {} PDF(s) into {} chunks.",
            report.documents_ingested, report.chunk_count
        );
    }
    Ok(())
}

async fn run_interactive(assistant: &Assistant) -> anyhow::Result<()> {
    let stdin = io::stdin();
    let mut line = String::new();

    loop {
        print!("\nYour Question: ");
        io::stdout().flush()?;

        line.clear();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }

        let query = line.trim();
        if EXIT_WORDS.contains(&query.to_lowercase().as_str()) {
            println!("Thank you for using the bot!");
            break;
        }
        if query.is_empty() {
            continue;
        }

        let response = assistant.chat(query).await;
        print_response(assistant, &response);
    }

    Ok(())
}

fn print_response(assistant: &Assistant, response: &str) {
    let language = assistant.prompts().language();
    match split_sections(response, language) {
        Some(sections) => {
            println!("\nEnglish:\n\n{}", sections.english);
            println!("\n{}:\n\n{}", language.name, sections.translated);
        }
        None => println!("{response}"),
    }
}
