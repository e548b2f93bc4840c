//! Command-line entrypoint for answering questions against a local or remote policy PDF.
//!
//! Runs the same fetch, extraction, and resolution pipeline as the HTTP server, without the
//! bearer-token gate, and prints the answers as a JSON array.
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use axum::body::Bytes;
use clap::Parser;
use policyqa::{
    config::{Config, DEFAULT_FETCH_TIMEOUT_SECS},
    logging,
    processing::{DocumentReference, QuestionAnsweringService, QuestionRequest},
};

#[derive(Parser)]
#[command(
    name = "policy-qa",
    about = "Answer questions about a policy PDF from the command line"
)]
struct Cli {
    /// URL of the policy PDF.
    #[arg(long, conflicts_with = "file", required_unless_present = "file")]
    url: Option<String>,
    /// Path to a local policy PDF.
    #[arg(long)]
    file: Option<PathBuf>,
    /// Question to answer; repeat for several.
    #[arg(long = "question", short = 'q', required = true)]
    questions: Vec<String>,
    /// JSON knowledge base replacing the built-in answers.
    #[arg(long)]
    knowledge_base: Option<PathBuf>,
    /// Timeout for downloading `--url`.
    #[arg(long, default_value_t = DEFAULT_FETCH_TIMEOUT_SECS)]
    timeout_secs: u64,
}

#[tokio::main]
async fn main() {
    logging::init_cli_tracing();
    if let Err(err) = run(Cli::parse()).await {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = Config {
        fetch_timeout: Duration::from_secs(cli.timeout_secs.max(1)),
        knowledge_base_path: cli.knowledge_base,
        ..Config::default()
    };
    let service =
        QuestionAnsweringService::from_config(&config).context("failed to build pipeline")?;

    let upload = match &cli.file {
        Some(path) => {
            let bytes = tokio::fs::read(path)
                .await
                .with_context(|| format!("failed to read {}", path.display()))?;
            Some(Bytes::from(bytes))
        }
        None => None,
    };
    let document = DocumentReference::from_parts(cli.url, upload)?;
    let request = QuestionRequest::new(document, cli.questions)?;

    let answers = service
        .answer(request)
        .await
        .context("failed to answer questions")?;
    let rendered = serde_json::to_string_pretty(&answers).context("failed to render answers")?;
    println!("{rendered}");
    Ok(())
}
