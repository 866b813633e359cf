//! CLI argument definitions and shared statics.

use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use std::sync::OnceLock;

pub static FILE_GUARD: OnceLock<tracing_appender::non_blocking::WorkerGuard> = OnceLock::new();

#[derive(Parser, Debug)]
#[command(name = "pitctl", version, about = "Pit controller CLI")]
pub struct Cli {
    /// Path to config TOML (typed)
    #[arg(long, value_name = "FILE", default_value = "etc/pitctl.toml")]
    pub config: PathBuf,

    /// Optional probe-calibration CSV (strict header)
    #[arg(long, value_name = "FILE")]
    pub calibration: Option<PathBuf>,

    /// Log as JSON lines instead of pretty
    #[arg(long, action = ArgAction::SetTrue)]
    pub json: bool,

    /// Console log level (error|warn|info|debug|trace)
    #[arg(long = "log-level", value_name = "LEVEL", default_value = "info")]
    pub log_level: String,

    /// Command to execute
    #[command(subcommand)]
    pub cmd: Commands,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
pub enum ExportFormat {
    Csv,
    Json,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the control loop against the configured backend
    Run {
        /// Override the configured pit setpoint (degrees)
        #[arg(long, value_name = "DEG")]
        setpoint: Option<f32>,
        /// Stop after this many seconds (runs until interrupted if unset)
        #[arg(long, value_name = "SECS")]
        duration_s: Option<u64>,
        /// Start a fresh cook session instead of resuming a recovered one
        #[arg(long, action = ArgAction::SetTrue)]
        new_session: bool,
        /// Print a final state snapshot as JSON on completion
        #[arg(long, action = ArgAction::SetTrue)]
        snapshot: bool,
    },
    /// Export the recorded cook session
    Export {
        /// Output format
        #[arg(long, value_enum, default_value = "csv")]
        format: ExportFormat,
        /// Write to a file instead of stdout
        #[arg(long, value_name = "FILE")]
        out: Option<PathBuf>,
    },
    /// Quick health check (config parses, ports respond)
    SelfCheck,
}
