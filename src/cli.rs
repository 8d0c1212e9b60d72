use std::path::PathBuf;

use clap::{Parser, ValueEnum};

use crate::output::OutputFormat;

/// Prepare the local BigQuery optimization agent stack
///
/// Downloads the pinned tool binaries, creates the environment profile,
/// fills the tools file and installs dependencies. Safe to run repeatedly:
/// work that is already done is skipped.
#[derive(Parser, Debug)]
#[command(name = "bq-agent-bootstrap")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Project directory to bootstrap
    #[arg(long, default_value = ".")]
    pub root: PathBuf,

    /// Do not run the dependency installer
    #[arg(long, env = "AGENT_BOOTSTRAP_SKIP_DEPS")]
    pub skip_deps: bool,

    /// Show what would be done without changing anything
    #[arg(long)]
    pub dry_run: bool,

    /// Output format
    #[arg(short = 'f', long, value_enum, default_value = "text")]
    pub output_format: Format,

    /// Enable debug logging on stderr
    #[arg(short, long)]
    pub verbose: bool,

    /// Disable colored output
    #[arg(long)]
    pub no_color: bool
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum Format {
    Text,
    Json
}

impl From<Format> for OutputFormat {
    fn from(format: Format) -> Self {
        match format {
            Format::Text => Self::Text,
            Format::Json => Self::Json
        }
    }
}
