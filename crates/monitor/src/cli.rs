use clap::Parser;
use std::path::PathBuf;

/// Extract dashboard metrics from an enrolment-sync log
#[derive(Debug, Parser)]
#[command(name = "monitor", version, about, long_about = None)]
pub struct Cli {
    /// Configuration file (TOML). Without it the standard search paths are used
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Sync log to analyse (overrides source.log_file)
    #[arg(short, long, value_name = "FILE")]
    pub log_file: Option<PathBuf>,

    /// Write the JSON snapshot here instead of stdout (overrides output.path)
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Pretty-print the JSON snapshot
    #[arg(long)]
    pub pretty: bool,
}
