mod cli;
mod display;
mod error;

use crate::cli::{Cli, Format};
use crate::error::{ErrorKind, Result};
use clap::Parser;
use exn::ResultExt;
use futures::{Stream, StreamExt};
use hnsample_config::Config;
use hnsample_pipeline::{Controller, Retrieval, RetrievalState};
use hnsample_source::HttpSource;
use std::process::ExitCode;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    match run(cli).await {
        Ok(code) => code,
        Err(err) => {
            tracing::error!(error = ?err, "Aborting");
            eprintln!("error: {}", *err);
            ExitCode::FAILURE
        },
    }
}

fn init_tracing(verbose: bool) {
    let fallback = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));
    // Logs go to stderr; stdout only carries the stories.
    tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).init();
}

async fn run(cli: Cli) -> Result<ExitCode> {
    let config = Config::load(cli.config.as_deref()).or_raise(|| ErrorKind::Config)?;
    let source = HttpSource::with_options(
        "hacker-news",
        &config.api.base_url,
        config.api.timeout(),
        config.api.max_concurrent_requests,
        &config.api.user_agent,
    )
    .or_raise(|| ErrorKind::Source)?;

    let controller = Arc::new(Controller::new(Arc::new(source)).with_limit(cli.sample_size()));
    let progress = tokio::spawn(show_progress(controller.changes()));
    let retrieval = controller.activate().await.or_raise(|| ErrorKind::Task)?;
    // Dropping the last handle ends the state stream, and with it the
    // progress task.
    drop(controller);
    _ = progress.await;

    render(&retrieval, cli.format)
}

/// Loading indicator on stderr.
async fn show_progress(changes: impl Stream<Item = RetrievalState>) {
    let mut changes = std::pin::pin!(changes);
    while let Some(state) = changes.next().await {
        if matches!(state, RetrievalState::Loading) {
            eprintln!("Loading top stories...");
        }
    }
}

fn render(retrieval: &Retrieval, format: Format) -> Result<ExitCode> {
    if let Some(failure) = &retrieval.failure {
        eprintln!("{failure}");
        return Ok(ExitCode::FAILURE);
    }
    match format {
        Format::Table => print!("{}", display::table(&retrieval.records)),
        Format::Json => {
            let json = serde_json::to_string_pretty(&*retrieval.records).or_raise(|| ErrorKind::Output)?;
            println!("{json}");
        },
    }
    Ok(ExitCode::SUCCESS)
}
