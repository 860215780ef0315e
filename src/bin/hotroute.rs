//! Hotroute CLI Binary
//!
//! Demo front end: validates a configuration, or runs emitting workers against a
//! root facade that reloads when the configuration file changes.

use anyhow::Context;
use clap::Parser;
use hotroute::cli::{Cli, RunContext};
use hotroute::config::ConfigLoader;
use hotroute::logging::{init_logging, LoggingConfig};
use std::process;
use tracing::{error, info};

fn main() {
    let cli = Cli::parse();

    let logging_config = build_logging_config(&cli);
    if let Err(e) = init_logging(Some(&logging_config)) {
        eprintln!("Failed to initialize logging: {}", e);
        process::exit(1);
    }

    info!("Hotroute CLI starting");

    match execute(&cli) {
        Ok(output) => {
            info!("Command completed successfully");
            println!("{}", output);
        }
        Err(e) => {
            error!("Command failed: {:#}", e);
            eprintln!("{:#}", e);
            process::exit(1);
        }
    }
}

fn execute(cli: &Cli) -> anyhow::Result<String> {
    let context = RunContext::new(cli.config.clone())
        .with_context(|| format!("Error loading configuration {}", cli.config.display()))?;
    let output = context.execute(&cli.command)?;
    Ok(output)
}

/// Build logging configuration from CLI args and config file.
/// Precedence: CLI flags override config file override defaults.
fn build_logging_config(cli: &Cli) -> LoggingConfig {
    let mut config = ConfigLoader::load_from_file(&cli.config)
        .ok()
        .map(|c| c.logging)
        .unwrap_or_default();

    if cli.verbose {
        config.level = "debug".to_string();
    }
    if let Some(ref level) = cli.log_level {
        config.level = level.clone();
    }
    if let Some(format) = cli.log_format {
        config.format = format;
    }

    config
}
