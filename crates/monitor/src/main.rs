mod cli;
mod config;
mod error;
mod output;
mod source;

use anyhow::{Context, Result};
use clap::Parser;
use engine::Extractor;
use std::sync::Arc;
use tracing::info;

use crate::{
    cli::Cli,
    config::{LogFormat, LogOutput, MonitorConfig},
};

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Phase 1: Basic tracing so we can log during config loading
    // Uses set_default (thread-local) so it can be replaced by Phase 2's global subscriber
    let basic_tracing = init_tracing_basic();

    info!("Starting enrolment monitor v{}", env!("CARGO_PKG_VERSION"));

    let mut config = MonitorConfig::load(cli.config.as_deref())
        .context("Failed to load configuration")?;
    config.apply_cli(&cli);
    config.validate()
        .context("Configuration validation failed")?;

    // Phase 2: Re-initialize tracing with config (format, level, output)
    drop(basic_tracing);
    init_tracing_from_config(&config)?;

    let registry = Arc::new(config.registry.build());
    info!("Code registry has {} codes", registry.len());
    let extractor = Extractor::new(registry, config.extraction.clone());

    let source = source::read_log(&config.source.log_file)
        .context("Failed to read sync log")?;

    let snapshot = extractor.extract(&source.lines, source.modified);

    info!(
        source = %source.path.display(),
        dialect = %snapshot.dialect,
        total = snapshot.total_records,
        successful = snapshot.successful,
        errors = snapshot.errors,
        skipped = snapshot.skipped_records,
        batches = snapshot.completed_batches.len(),
        success_rate = snapshot.success_rate(),
        "✓ Metrics extracted"
    );

    output::write_snapshot(&snapshot, config.output.path.as_deref(), config.output.pretty)
        .context("Failed to write snapshot")?;

    Ok(())
}

/// Phase 1: Basic tracing for early startup (before config is loaded).
/// Returns a guard that must be dropped before Phase 2 sets the global subscriber.
fn init_tracing_basic() -> tracing::subscriber::DefaultGuard {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,monitor=debug"));

    let subscriber = fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_default(subscriber)
}

/// Phase 2: Re-initialize tracing with configuration values.
fn init_tracing_from_config(config: &MonitorConfig) -> Result<()> {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    // Prefer RUST_LOG env var, fall back to config level
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    let open_log = |path: &str| {
        std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .with_context(|| format!("Failed to open log file '{}'", path))
            .map(Arc::new)
    };

    match (&config.logging.format, &config.logging.output) {
        (LogFormat::Json, LogOutput::Stderr) => {
            let layer = fmt::layer()
                .json()
                .with_target(true)
                .with_writer(std::io::stderr);
            tracing_subscriber::registry().with(filter).with(layer).init();
        }
        (LogFormat::Json, LogOutput::File { path }) => {
            let layer = fmt::layer()
                .json()
                .with_target(true)
                .with_ansi(false)
                .with_writer(open_log(path)?);
            tracing_subscriber::registry().with(filter).with(layer).init();
        }
        (LogFormat::Pretty, LogOutput::Stderr) => {
            let layer = fmt::layer()
                .with_target(true)
                .with_thread_ids(false)
                .with_file(false)
                .with_line_number(false)
                .with_writer(std::io::stderr);
            tracing_subscriber::registry().with(filter).with(layer).init();
        }
        (LogFormat::Pretty, LogOutput::File { path }) => {
            let layer = fmt::layer()
                .with_target(true)
                .with_thread_ids(false)
                .with_file(false)
                .with_line_number(false)
                .with_ansi(false)
                .with_writer(open_log(path)?);
            tracing_subscriber::registry().with(filter).with(layer).init();
        }
    }

    Ok(())
}
