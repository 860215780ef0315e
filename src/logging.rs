//! Logging System
//!
//! Diagnostics for hotroute itself, built on `tracing-subscriber`. Records that a
//! pipeline forwards through [`TracingSink`](crate::pipeline::TracingSink) land
//! in the same subscriber under the `hotroute::record` target, whose level is
//! set separately by [`LoggingConfig::records`].

use crate::error::FacadeError;
use crate::pipeline::sink::RECORD_TARGET;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt as stdfmt;
use std::str::FromStr;
use tracing_subscriber::filter::Directive;
use tracing_subscriber::fmt::time::ChronoUtc;
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Registry};

const ENV_FILTER: &str = "HOTROUTE_LOG";
const ENV_FORMAT: &str = "HOTROUTE_LOG_FORMAT";
const ENV_OUTPUT: &str = "HOTROUTE_LOG_OUTPUT";

/// How diagnostic lines are rendered.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl FromStr for LogFormat {
    type Err = FacadeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "text" => Ok(LogFormat::Text),
            "json" => Ok(LogFormat::Json),
            other => Err(FacadeError::Config(format!(
                "Invalid log format: {} (must be 'json' or 'text')",
                other
            ))),
        }
    }
}

/// Where diagnostic lines are written.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogOutput {
    Stdout,
    #[default]
    Stderr,
}

impl FromStr for LogOutput {
    type Err = FacadeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "stdout" => Ok(LogOutput::Stdout),
            "stderr" => Ok(LogOutput::Stderr),
            other => Err(FacadeError::Config(format!(
                "Invalid log output: {} (must be 'stdout' or 'stderr')",
                other
            ))),
        }
    }
}

impl stdfmt::Display for LogOutput {
    fn fmt(&self, f: &mut stdfmt::Formatter<'_>) -> stdfmt::Result {
        f.write_str(match self {
            LogOutput::Stdout => "stdout",
            LogOutput::Stderr => "stderr",
        })
    }
}

/// Logging configuration, the `[logging]` section of the config file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default filter level: trace, debug, info, warn, error, off
    #[serde(default = "default_level")]
    pub level: String,

    #[serde(default)]
    pub format: LogFormat,

    #[serde(default)]
    pub output: LogOutput,

    /// ANSI colors (text format only)
    #[serde(default = "default_color")]
    pub color: bool,

    /// Level for records forwarded by `TracingSink`. Falls back to `level`.
    #[serde(default)]
    pub records: Option<String>,

    /// Per-module levels, e.g. `"hotroute::watch" = "debug"`
    #[serde(default)]
    pub modules: BTreeMap<String, String>,
}

fn default_level() -> String {
    "info".to_string()
}

fn default_color() -> bool {
    true
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
            format: LogFormat::default(),
            output: LogOutput::default(),
            color: default_color(),
            records: None,
            modules: BTreeMap::new(),
        }
    }
}

/// Install the global subscriber.
///
/// `HOTROUTE_LOG` replaces the configured filter entirely;
/// `HOTROUTE_LOG_FORMAT` and `HOTROUTE_LOG_OUTPUT` override single fields.
/// Fails if a subscriber is already installed.
pub fn init_logging(config: Option<&LoggingConfig>) -> Result<(), FacadeError> {
    let defaults = LoggingConfig::default();
    let config = config.unwrap_or(&defaults);

    let filter = match EnvFilter::try_from_env(ENV_FILTER) {
        Ok(filter) => filter,
        Err(_) => build_filter(config)?,
    };
    let format = env_override(ENV_FORMAT)?.unwrap_or(config.format);
    let output = env_override(ENV_OUTPUT)?.unwrap_or(config.output);

    let writer = match output {
        LogOutput::Stdout => BoxMakeWriter::new(std::io::stdout),
        LogOutput::Stderr => BoxMakeWriter::new(std::io::stderr),
    };

    let registry = Registry::default().with(filter);
    let installed = match format {
        LogFormat::Json => registry
            .with(
                fmt::layer()
                    .json()
                    .with_target(true)
                    .with_timer(ChronoUtc::rfc_3339())
                    .with_writer(writer),
            )
            .try_init(),
        LogFormat::Text => registry
            .with(
                fmt::layer()
                    .with_target(true)
                    .with_timer(ChronoUtc::rfc_3339())
                    .with_ansi(config.color)
                    .with_writer(writer),
            )
            .try_init(),
    };

    installed.map_err(|e| FacadeError::Config(format!("Failed to install subscriber: {}", e)))
}

/// Filter from config: base level, record target, then module directives.
fn build_filter(config: &LoggingConfig) -> Result<EnvFilter, FacadeError> {
    let mut filter = EnvFilter::new(&config.level);
    if let Some(records) = &config.records {
        filter = filter.add_directive(directive(RECORD_TARGET, records)?);
    }
    for (module, level) in &config.modules {
        filter = filter.add_directive(directive(module, level)?);
    }
    Ok(filter)
}

fn directive(target: &str, level: &str) -> Result<Directive, FacadeError> {
    format!("{}={}", target, level)
        .parse()
        .map_err(|e| FacadeError::Config(format!("Invalid log directive for {}: {}", target, e)))
}

fn env_override<T>(name: &str) -> Result<Option<T>, FacadeError>
where
    T: FromStr<Err = FacadeError>,
{
    match std::env::var(name) {
        Ok(value) => value.parse().map(Some),
        Err(_) => Ok(None),
    }
}
