//! Command-line entrypoint that runs the summarization pipeline once.
//!
//! Reads a document from `--input` (or stdin), summarizes it with the same configuration the
//! HTTP server uses, and prints the `/analyze` response body as JSON on stdout.
use std::{fs, io::Read, path::PathBuf};

use anyhow::{Context, Result, anyhow};
use clap::Parser;
use echobreak::{
    api::AnalyzeResponse,
    config::{Config, SummarizerBackend},
    logging,
    pipeline::{ChunkUnit, SummaryService},
};

#[derive(Parser)]
#[command(
    name = "echobreak-summarize",
    about = "Summarize a document with the EchoBreak pipeline"
)]
struct Cli {
    /// File to summarize; reads stdin when omitted.
    #[arg(long)]
    input: Option<PathBuf>,
    /// Override `SUMMARIZER_BACKEND` (huggingface, ollama, extractive).
    #[arg(long)]
    backend: Option<String>,
    /// Override `SUMMARIZER_MODELS` with a single model identifier.
    #[arg(long)]
    model: Option<String>,
    /// Override `CHUNK_UNIT` (tokens, words).
    #[arg(long)]
    chunk_unit: Option<String>,
    /// Pretty-print the JSON output.
    #[arg(long)]
    pretty: bool,
}

fn main() {
    if let Err(err) = run() {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}

#[tokio::main]
async fn run() -> Result<()> {
    dotenvy::dotenv().ok();
    logging::init_cli_tracing();
    let cli = Cli::parse();
    let config = apply_overrides(Config::from_env()?, &cli)?;
    let text = read_document(cli.input.as_ref())?;

    let service = SummaryService::new(&config)
        .await
        .context("failed to initialize summary service")?;
    let outcome = service.summarize_text(Some(text)).await?;
    let response = AnalyzeResponse::from(outcome);

    let rendered = if cli.pretty {
        serde_json::to_string_pretty(&response)?
    } else {
        serde_json::to_string(&response)?
    };
    println!("{rendered}");
    Ok(())
}

fn apply_overrides(mut config: Config, cli: &Cli) -> Result<Config> {
    if let Some(backend) = &cli.backend {
        config.summarizer_backend = backend
            .parse::<SummarizerBackend>()
            .map_err(|()| anyhow!("unknown backend '{backend}'"))?;
    }
    if let Some(model) = &cli.model {
        config.summarizer_models = vec![model.clone()];
    }
    if let Some(unit) = &cli.chunk_unit {
        config.chunk_unit = unit
            .parse::<ChunkUnit>()
            .map_err(|()| anyhow!("unknown chunk unit '{unit}'"))?;
    }
    Ok(config)
}

fn read_document(input: Option<&PathBuf>) -> Result<String> {
    match input {
        Some(path) => fs::read_to_string(path)
            .with_context(|| format!("failed to read document at {}", path.display())),
        None => {
            let mut buffer = String::new();
            std::io::stdin()
                .read_to_string(&mut buffer)
                .context("failed to read document from stdin")?;
            Ok(buffer)
        }
    }
}
