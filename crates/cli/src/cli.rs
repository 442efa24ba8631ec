//! CLI argument definitions using clap.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Telemetry Engine - per-vehicle telemetry analysis from decoded logs
#[derive(Parser, Debug)]
#[command(
    name = "telemetry-engine",
    author,
    version,
    about = "Per-vehicle telemetry store and flight analysis",
    long_about = "Loads already-decoded telemetry (JSON lines), keeps one data store per vehicle,\n\
                  aligns relative clocks to absolute time, derives flight-book, power and\n\
                  glide performance data, and prints a per-vehicle summary."
)]
pub struct Cli {
    /// Increase logging verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true, env = "TELEMETRY_ENGINE_VERBOSE")]
    pub verbose: u8,

    /// Suppress all output except warnings and errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Log output format
    #[arg(
        long,
        value_enum,
        default_value = "pretty",
        global = true,
        env = "TELEMETRY_ENGINE_LOG_FORMAT"
    )]
    pub log_format: LogFormat,

    /// Prometheus exporter port (disabled when absent)
    #[arg(long, global = true, env = "TELEMETRY_ENGINE_METRICS_PORT")]
    pub metrics_port: Option<u16>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Load inputs, merge them, run the analysis and print the overview
    Run(RunArgs),

    /// Validate an engine configuration file
    Validate(ValidateArgs),

    /// List every data unit per system of one input
    Info(InfoArgs),
}

/// Arguments for the `run` command
#[derive(Parser, Debug, Clone)]
pub struct RunArgs {
    /// JSON-lines input file; repeat to merge several
    #[arg(short, long = "input", required = true, num_args = 1..)]
    pub inputs: Vec<PathBuf>,

    /// Engine configuration file (TOML or JSON)
    #[arg(short, long, env = "TELEMETRY_ENGINE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Delay applied to every input after the first before merging (seconds)
    #[arg(long, default_value = "0", allow_negative_numbers = true)]
    pub shift_sec: f64,

    /// Keep relative time; skip the absolute offset estimation
    #[arg(long)]
    pub no_time_offset: bool,

    /// Stop at the first malformed input line
    #[arg(long)]
    pub strict: bool,

    /// Output a JSON snapshot instead of the text overview
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `validate` command
#[derive(Parser, Debug)]
pub struct ValidateArgs {
    /// Path to configuration file to validate
    #[arg(short, long, default_value = "engine.toml")]
    pub config: PathBuf,

    /// Output validation result as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `info` command
#[derive(Parser, Debug)]
pub struct InfoArgs {
    /// JSON-lines input file
    #[arg(short, long)]
    pub input: PathBuf,

    /// Engine configuration file (TOML or JSON)
    #[arg(short, long, env = "TELEMETRY_ENGINE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Run the analysis first so derived units are listed too
    #[arg(long)]
    pub process: bool,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

/// Log output format
#[derive(ValueEnum, Clone, Copy, Debug, Default)]
pub enum LogFormat {
    /// JSON structured logging
    Json,
    /// Human-readable pretty format
    #[default]
    Pretty,
    /// Compact single-line format
    Compact,
}

impl From<LogFormat> for observability::LogFormat {
    fn from(format: LogFormat) -> Self {
        match format {
            LogFormat::Json => observability::LogFormat::Json,
            LogFormat::Pretty => observability::LogFormat::Pretty,
            LogFormat::Compact => observability::LogFormat::Compact,
        }
    }
}
