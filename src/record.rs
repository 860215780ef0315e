//! Records and severity levels
//!
//! A [`Record`] is the unit a facade emits: a timestamp, a [`Level`], a parsed
//! message template and the properties bound to it or added by enrichers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

pub mod template;

pub use template::{BoundTemplate, MessageTemplate, Token};

/// Record severity, ordered from least to most severe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
    Fatal,
}

impl Level {
    pub const ALL: [Level; 6] = [
        Level::Trace,
        Level::Debug,
        Level::Info,
        Level::Warn,
        Level::Error,
        Level::Fatal,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Level::Trace => "trace",
            Level::Debug => "debug",
            Level::Info => "info",
            Level::Warn => "warn",
            Level::Error => "error",
            Level::Fatal => "fatal",
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Level {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "trace" | "verbose" => Ok(Level::Trace),
            "debug" => Ok(Level::Debug),
            "info" | "information" => Ok(Level::Info),
            "warn" | "warning" => Ok(Level::Warn),
            "error" => Ok(Level::Error),
            "fatal" => Ok(Level::Fatal),
            other => Err(format!("Unknown level: {}", other)),
        }
    }
}

/// A structured record travelling through a pipeline.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub timestamp: DateTime<Utc>,
    pub level: Level,
    pub template: MessageTemplate,
    pub properties: BTreeMap<String, Value>,
}

impl Record {
    /// Create a record from an already bound template, stamped with the current time.
    pub fn new(level: Level, bound: BoundTemplate) -> Self {
        Self {
            timestamp: Utc::now(),
            level,
            template: bound.template,
            properties: bound.properties,
        }
    }

    /// Create a record with no arguments. Text that does not parse as a
    /// template is carried verbatim.
    pub fn from_text(level: Level, text: &str) -> Self {
        let template =
            MessageTemplate::parse(text).unwrap_or_else(|| MessageTemplate::literal(text));
        Self {
            timestamp: Utc::now(),
            level,
            template,
            properties: BTreeMap::new(),
        }
    }

    /// Builder-style property setter, overwriting any existing value.
    pub fn with_property(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.properties.insert(name.into(), value.into());
        self
    }

    /// Add a property unless the record already carries one with that name.
    pub fn add_property_if_absent(&mut self, name: &str, value: &Value) {
        if !self.properties.contains_key(name) {
            self.properties.insert(name.to_string(), value.clone());
        }
    }

    pub fn property(&self, name: &str) -> Option<&Value> {
        self.properties.get(name)
    }

    /// Render the message template against the record's properties.
    pub fn message(&self) -> String {
        self.template.render(&self.properties)
    }
}
