//! Configuration System
//!
//! Loads hotroute settings from a TOML file layered over defaults, with
//! `HOTROUTE_`-prefixed environment variables on top (`__` separates nested
//! keys, e.g. `HOTROUTE_PIPELINE__MIN_LEVEL=debug`).
//!
//! [`PipelineSettings`] is the configuration-driven description of a routing
//! pipeline; it validates itself and applies to a [`RoutingBuilder`].

use crate::error::FacadeError;
use crate::logging::LoggingConfig;
use crate::pipeline::{NullSink, RoutingBuilder, TracingSink};
use crate::record::Level;
use config::builder::DefaultState;
use config::{Config, ConfigBuilder, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HotrouteConfig {
    /// Diagnostics of hotroute itself
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Pipeline the root facade is built from and reloaded to
    #[serde(default)]
    pub pipeline: PipelineSettings,

    /// Config file watching
    #[serde(default)]
    pub watch: WatchSettings,
}

/// Destinations a configured pipeline can write to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SinkKind {
    Tracing,
    Null,
}

impl FromStr for SinkKind {
    type Err = FacadeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "tracing" => Ok(SinkKind::Tracing),
            "null" => Ok(SinkKind::Null),
            other => Err(FacadeError::InvalidArgument(format!(
                "Unknown sink kind: {} (must be 'tracing' or 'null')",
                other
            ))),
        }
    }
}

/// Pipeline description
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineSettings {
    /// Records below this level are dropped
    #[serde(default = "default_min_level")]
    pub min_level: Level,

    /// Sink kinds, in write order
    #[serde(default = "default_sinks")]
    pub sinks: Vec<String>,

    /// Properties added to every record
    #[serde(default)]
    pub properties: BTreeMap<String, Value>,
}

fn default_min_level() -> Level {
    Level::Info
}

fn default_sinks() -> Vec<String> {
    vec!["tracing".to_string()]
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            min_level: default_min_level(),
            sinks: default_sinks(),
            properties: BTreeMap::new(),
        }
    }
}

impl PipelineSettings {
    pub fn validate(&self) -> Result<(), FacadeError> {
        if self.sinks.is_empty() {
            return Err(FacadeError::InvalidArgument(
                "pipeline.sinks must name at least one sink".to_string(),
            ));
        }
        for sink in &self.sinks {
            SinkKind::from_str(sink)?;
        }
        if self.properties.keys().any(|name| name.trim().is_empty()) {
            return Err(FacadeError::InvalidArgument(
                "pipeline.properties contains an empty name".to_string(),
            ));
        }
        Ok(())
    }

    /// Apply these settings to `builder`. Unknown sink kinds are skipped;
    /// call [`validate`](Self::validate) first to reject them.
    pub fn apply(&self, builder: RoutingBuilder) -> RoutingBuilder {
        let mut builder = builder.minimum_level(self.min_level);
        for (name, value) in &self.properties {
            builder = builder.with_property(name.clone(), value.clone());
        }
        for sink in &self.sinks {
            builder = match SinkKind::from_str(sink) {
                Ok(SinkKind::Tracing) => builder.write_to(Arc::new(TracingSink)),
                Ok(SinkKind::Null) => builder.write_to(Arc::new(NullSink)),
                Err(_) => builder,
            };
        }
        builder
    }
}

/// Watch configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WatchSettings {
    /// Reload when the config file changes
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Quiet period after the last file event before reloading (ms)
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
}

fn default_true() -> bool {
    true
}

fn default_debounce_ms() -> u64 {
    250
}

impl Default for WatchSettings {
    fn default() -> Self {
        Self {
            enabled: default_true(),
            debounce_ms: default_debounce_ms(),
        }
    }
}

impl HotrouteConfig {
    pub fn validate(&self) -> Result<(), FacadeError> {
        self.pipeline.validate()
    }
}

/// Loads [`HotrouteConfig`] from layered sources.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load from a TOML file. A missing file is an error.
    pub fn load_from_file(path: &Path) -> Result<HotrouteConfig, FacadeError> {
        let builder = Self::builder_with_defaults()?
            .add_source(File::from(path).format(FileFormat::Toml).required(true));
        Self::finish(builder)
    }

    /// Load from TOML text. Used for inline configuration and tests.
    pub fn load_from_str(toml: &str) -> Result<HotrouteConfig, FacadeError> {
        let builder =
            Self::builder_with_defaults()?.add_source(File::from_str(toml, FileFormat::Toml));
        Self::finish(builder)
    }

    fn builder_with_defaults() -> Result<ConfigBuilder<DefaultState>, FacadeError> {
        Ok(Config::builder()
            .set_default("pipeline.min_level", "info")?
            .set_default("pipeline.sinks", vec!["tracing"])?
            .set_default("watch.enabled", true)?
            .set_default("watch.debounce_ms", default_debounce_ms())?)
    }

    fn finish(builder: ConfigBuilder<DefaultState>) -> Result<HotrouteConfig, FacadeError> {
        let config: HotrouteConfig = builder
            .add_source(
                Environment::with_prefix("HOTROUTE")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()?;
        config.validate()?;
        Ok(config)
    }
}

/// Serializes unit tests that load configuration, since every load layers
/// `HOTROUTE_*` environment variables.
#[cfg(test)]
pub(crate) fn test_env_lock() -> parking_lot::MutexGuard<'static, ()> {
    static ENV_LOCK: parking_lot::Mutex<()> = parking_lot::const_mutex(());
    ENV_LOCK.lock()
}
