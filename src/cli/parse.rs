//! CLI parse: clap types for hotroute. No behavior; definitions only.

use crate::logging::LogFormat;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Hotroute CLI - reconfigurable record routing demo
#[derive(Parser)]
#[command(name = "hotroute")]
#[command(about = "Route structured records through a hot-reloadable pipeline")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Configuration file path
    #[arg(long, global = true, default_value = "hotroute.toml")]
    pub config: PathBuf,

    /// Enable verbose logging (default: off)
    #[arg(long, default_value = "false")]
    pub verbose: bool,

    /// Log level (trace, debug, info, warn, error, off)
    #[arg(long)]
    pub log_level: Option<String>,

    /// Log format
    #[arg(long, value_enum)]
    pub log_format: Option<LogFormat>,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Load and validate the configuration
    Check,
    /// Emit sample records while watching the configuration for changes
    Run {
        /// Number of emitting worker threads
        #[arg(long, default_value = "4")]
        workers: usize,
        /// Total run time in seconds
        #[arg(long, default_value = "10")]
        duration_secs: u64,
        /// Freeze the pipeline after this many seconds
        #[arg(long)]
        freeze_after_secs: Option<u64>,
        /// Pause between records per worker (ms)
        #[arg(long, default_value = "100")]
        interval_ms: u64,
    },
}
