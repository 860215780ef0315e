//! Pipeline Contracts
//!
//! The facades treat a pipeline as an opaque, immutable, disposable object. This
//! module names the capabilities they rely on: [`Pipeline`] for the built chain,
//! [`PipelineBuilder`] for materializing one during `reload`, and [`Enricher`] /
//! [`Extension`] for the context a derived facade adds to every record.
//!
//! Pipelines are never mutated after `build`. Deriving or reconfiguring always
//! produces a new instance, which is what lets derived facades detect staleness
//! by comparing generation tokens.

use crate::error::{BuildError, FacadeError};
use crate::record::{BoundTemplate, Level, MessageTemplate, Record};
use serde::Serialize;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

pub mod routing;
pub mod sink;

pub use routing::{RoutingBuilder, RoutingPipeline};
pub use sink::{MemorySink, NullSink, Sink, TracingSink};

/// Shared handle to a built pipeline.
pub type SharedPipeline = Arc<dyn Pipeline>;

/// A built processing chain that accepts records and routes them to destinations.
pub trait Pipeline: Send + Sync {
    /// Process one record. A single call is handled entirely by this pipeline.
    fn emit(&self, record: Record);

    /// Whether records at `level` would be processed at all.
    fn is_enabled(&self, level: Level) -> bool;

    /// Parse `template` and bind `args` to its holes.
    fn bind_template(&self, template: &str, args: &[Value]) -> Option<BoundTemplate> {
        MessageTemplate::parse(template).map(|parsed| parsed.bind(args))
    }

    /// Produce a new pipeline that applies `enricher` to every record before
    /// routing it to this pipeline's destinations.
    fn derive(&self, enricher: Arc<dyn Enricher>) -> SharedPipeline;

    /// Release the destinations this pipeline owns. Idempotent.
    fn dispose(&self);
}

/// Accepts configuration directives and materializes a finished pipeline.
///
/// A fresh `Default` builder is handed to every reload.
pub trait PipelineBuilder: Default {
    fn build(self) -> Result<SharedPipeline, BuildError>;
}

/// Adds context to a record. Must be pure: it is replayed on every derivation.
pub trait Enricher: Send + Sync {
    fn enrich(&self, record: &mut Record);
}

impl<F> Enricher for F
where
    F: Fn(&mut Record) + Send + Sync,
{
    fn enrich(&self, record: &mut Record) {
        self(record)
    }
}

/// Adds a fixed property unless the record already has one with that name.
#[derive(Debug, Clone)]
pub struct PropertyEnricher {
    name: String,
    value: Value,
}

impl PropertyEnricher {
    pub fn new(name: impl Into<String>, value: Value) -> Self {
        Self {
            name: name.into(),
            value,
        }
    }
}

impl Enricher for PropertyEnricher {
    fn enrich(&self, record: &mut Record) {
        record.add_property_if_absent(&self.name, &self.value);
    }
}

/// Recipe a derived facade keeps so it can rebuild its view from any root pipeline.
#[derive(Clone)]
pub struct Extension {
    label: String,
    enricher: Arc<dyn Enricher>,
}

impl Extension {
    /// Attach a scalar property. The value is replayed on each derivation.
    pub fn property(name: impl Into<String>, value: impl Into<Value>) -> Result<Self, FacadeError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(FacadeError::InvalidArgument(
                "Property name must not be empty".to_string(),
            ));
        }
        Ok(Self {
            label: format!("property:{}", name),
            enricher: Arc::new(PropertyEnricher::new(name, value.into())),
        })
    }

    /// Attach an arbitrary value, serialized now.
    ///
    /// The caller keeps ownership of `value` and may mutate it afterwards;
    /// the extension only ever sees this snapshot.
    pub fn capture<T>(name: impl Into<String>, value: &T) -> Result<Self, FacadeError>
    where
        T: Serialize + ?Sized,
    {
        let name = name.into();
        let snapshot = serde_json::to_value(value).map_err(|e| {
            FacadeError::InvalidArgument(format!("Cannot capture property '{}': {}", name, e))
        })?;
        Self::property(name, snapshot)
    }

    /// Tag records with the type they originate from.
    pub fn source_context<T: ?Sized>() -> Self {
        let type_name = std::any::type_name::<T>();
        Self {
            label: format!("source:{}", type_name),
            enricher: Arc::new(PropertyEnricher::new(
                "SourceContext",
                Value::String(type_name.to_string()),
            )),
        }
    }

    /// Use a custom enricher.
    pub fn enricher(label: impl Into<String>, enricher: Arc<dyn Enricher>) -> Self {
        Self {
            label: label.into(),
            enricher,
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    /// Apply this extension on top of `parent`.
    pub fn apply(&self, parent: &dyn Pipeline) -> SharedPipeline {
        parent.derive(Arc::clone(&self.enricher))
    }
}

impl fmt::Debug for Extension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Extension")
            .field("label", &self.label)
            .finish()
    }
}
