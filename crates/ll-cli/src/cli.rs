//! CLI argument definitions using clap derive API

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand, ValueEnum};

/// Ledgerline - incremental loads into a month-partitioned lake
#[derive(Parser, Debug)]
#[command(name = "ll")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Global options
    #[command(flatten)]
    pub global: GlobalArgs,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Global arguments available to all commands
#[derive(Args, Debug, Clone)]
pub struct GlobalArgs {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to project directory
    #[arg(short = 'p', long, global = true, default_value = ".")]
    pub project_dir: String,

    /// Override config file path
    #[arg(short, long, global = true)]
    pub config: Option<String>,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run one incremental load
    Run(RunArgs),

    /// Show the extraction window without touching anything
    Window(WindowArgs),

    /// Show cutoff, last success, and open lineage records
    Status(StatusArgs),

    /// Inspect or resolve lineage records
    Lineage(LineageArgs),
}

/// Output formats
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// Human-readable text
    #[default]
    Text,
    /// JSON output
    Json,
}

/// Arguments for the run command
#[derive(Args, Debug)]
pub struct RunArgs {
    /// Run as if today were this date (YYYY-MM-DD)
    #[arg(long)]
    pub as_of: Option<NaiveDate>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    pub output: OutputFormat,
}

/// Arguments for the window command
#[derive(Args, Debug)]
pub struct WindowArgs {
    /// Resolve the window for this date instead of today (YYYY-MM-DD)
    #[arg(long)]
    pub as_of: Option<NaiveDate>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    pub output: OutputFormat,
}

/// Arguments for the status command
#[derive(Args, Debug)]
pub struct StatusArgs {
    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    pub output: OutputFormat,

    /// Number of recent lineage records to show
    #[arg(long, default_value_t = 5)]
    pub recent: usize,
}

/// Arguments for the lineage command
#[derive(Args, Debug)]
pub struct LineageArgs {
    #[command(subcommand)]
    pub command: LineageCommands,
}

/// Lineage subcommands
#[derive(Subcommand, Debug)]
pub enum LineageCommands {
    /// List recent lineage records
    List(LineageListArgs),

    /// Close an open lineage record left by an interrupted load
    MarkFailed(MarkFailedArgs),
}

/// Arguments for lineage list
#[derive(Args, Debug)]
pub struct LineageListArgs {
    /// Maximum records to show, newest first
    #[arg(short, long, default_value_t = 20)]
    pub limit: usize,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    pub output: OutputFormat,
}

/// Arguments for lineage mark-failed
#[derive(Args, Debug)]
pub struct MarkFailedArgs {
    /// Lineage key of the open record
    pub key: i64,
}

#[cfg(test)]
#[path = "cli_test.rs"]
mod tests;
