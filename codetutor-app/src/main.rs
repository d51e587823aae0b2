use anyhow::{Context, Result};
use clap::Parser;
use codetutor_app::{AskOutcome, NO_INDEX_WARNING, Session, SessionConfig};
use codetutor_embed::{EmbedConfig, EmbeddingProvider, FastEmbedProvider};
use codetutor_llm::groq::{DEFAULT_BASE_URL, DEFAULT_MODEL, GroqProvider};
use codetutor_llm::LlmProvider;
use std::path::{Path, PathBuf};
use tokio::io::AsyncBufReadExt;

/// Chat with a zipped codebase: extract, chunk, embed, then answer
/// questions from the retrieved context.
#[derive(Parser, Debug)]
#[command(name = "codetutor", version, about, long_about = None)]
struct Args {
    /// Zip archive to process at startup
    #[arg(value_name = "ARCHIVE")]
    archive: Option<PathBuf>,

    /// Chat model name
    #[arg(long, default_value = DEFAULT_MODEL)]
    model: String,

    /// OpenAI-compatible API base URL
    #[arg(long, default_value = DEFAULT_BASE_URL)]
    base_url: String,

    /// Maximum completion tokens per answer
    #[arg(long, default_value_t = 1024)]
    max_tokens: u32,

    /// Number of chunks retrieved per question (overrides the config file)
    #[arg(long)]
    top_k: Option<usize>,

    /// Optional TOML session configuration
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => SessionConfig::load(path)?,
        None => SessionConfig::default(),
    };
    if let Some(top_k) = args.top_k {
        config.top_k = top_k;
    }

    let embedder = FastEmbedProvider::create(EmbedConfig::minilm_l6())
        .await
        .context("failed to initialize the embedding model")?;
    let llm = GroqProvider::from_env(args.base_url, args.model, args.max_tokens)?;

    let mut session = Session::new(config, embedder, llm);

    if let Some(path) = &args.archive {
        if let Err(err) = load_archive(&mut session, path).await {
            eprintln!("Error: {err:#}");
        }
    }

    println!("Ask a question about the codebase (:load <path.zip> to process an archive, :quit to exit).");

    let mut lines = tokio::io::BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if line == ":quit" || line == "exit" || line == "quit" {
            break;
        }
        if let Some(path) = line.strip_prefix(":load") {
            let path = path.trim();
            if path.is_empty() {
                println!("Usage: :load <path.zip>");
                continue;
            }
            if let Err(err) = load_archive(&mut session, Path::new(path)).await {
                eprintln!("Error: {err:#}");
            }
            continue;
        }

        if session.has_index() {
            println!("Thinking...");
        }
        match session.ask(line).await {
            Ok(AskOutcome::Answer(answer)) => println!("{answer}"),
            Ok(AskOutcome::NotReady) => println!("{NO_INDEX_WARNING}"),
            Err(err) => eprintln!("Error: {err:#}"),
        }
    }

    Ok(())
}

/// Read an archive from disk, process it, and report the counts.
async fn load_archive<E, L>(session: &mut Session<E, L>, path: &Path) -> Result<()>
where
    E: EmbeddingProvider,
    L: LlmProvider,
{
    let bytes = tokio::fs::read(path)
        .await
        .with_context(|| format!("failed to read {}", path.display()))?;

    println!("Analyzing code...");
    let report = session.process_archive(bytes).await?;

    println!("Found {} files.", report.documents);
    if report.skipped_files > 0 {
        println!("Skipped {} unreadable files.", report.skipped_files);
    }
    println!("Processed {} code chunks.", report.chunks);
    Ok(())
}
