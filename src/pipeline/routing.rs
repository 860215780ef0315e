//! Routing pipeline: a minimum level gate, enrichers, and fan-out to sinks.
//!
//! Derived pipelines share the destinations of the pipeline they were derived
//! from and only add context, so disposing the root-built instance releases
//! the sinks for all of them.

use super::{Enricher, Pipeline, PipelineBuilder, PropertyEnricher, SharedPipeline, Sink};
use crate::error::BuildError;
use crate::record::{Level, Record};
use serde_json::Value;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

struct Destinations {
    minimum_level: Level,
    enrichers: Vec<Arc<dyn Enricher>>,
    sinks: Vec<Arc<dyn Sink>>,
    disposed: AtomicBool,
}

/// Immutable routing chain produced by [`RoutingBuilder`].
pub struct RoutingPipeline {
    destinations: Arc<Destinations>,
    /// Derived context, outermost first.
    context: Vec<Arc<dyn Enricher>>,
}

impl RoutingPipeline {
    pub fn minimum_level(&self) -> Level {
        self.destinations.minimum_level
    }

    /// Number of derivations applied on top of the built pipeline.
    pub fn context_depth(&self) -> usize {
        self.context.len()
    }

    pub fn sink_count(&self) -> usize {
        self.destinations.sinks.len()
    }
}

impl Pipeline for RoutingPipeline {
    fn emit(&self, mut record: Record) {
        if record.level < self.destinations.minimum_level {
            return;
        }
        for enricher in self.context.iter().rev() {
            enricher.enrich(&mut record);
        }
        for enricher in &self.destinations.enrichers {
            enricher.enrich(&mut record);
        }
        for sink in &self.destinations.sinks {
            sink.emit(&record);
        }
    }

    fn is_enabled(&self, level: Level) -> bool {
        level >= self.destinations.minimum_level
    }

    fn derive(&self, enricher: Arc<dyn Enricher>) -> SharedPipeline {
        let mut context = self.context.clone();
        context.push(enricher);
        Arc::new(RoutingPipeline {
            destinations: Arc::clone(&self.destinations),
            context,
        })
    }

    fn dispose(&self) {
        if self.destinations.disposed.swap(true, Ordering::AcqRel) {
            return;
        }
        for sink in &self.destinations.sinks {
            sink.dispose();
        }
    }
}

/// Configuration directives for a [`RoutingPipeline`].
pub struct RoutingBuilder {
    minimum_level: Level,
    enrichers: Vec<Arc<dyn Enricher>>,
    sinks: Vec<Arc<dyn Sink>>,
}

impl Default for RoutingBuilder {
    fn default() -> Self {
        Self {
            minimum_level: Level::Info,
            enrichers: Vec::new(),
            sinks: Vec::new(),
        }
    }
}

impl RoutingBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn minimum_level(mut self, level: Level) -> Self {
        self.minimum_level = level;
        self
    }

    pub fn enrich_with(mut self, enricher: Arc<dyn Enricher>) -> Self {
        self.enrichers.push(enricher);
        self
    }

    pub fn with_property(self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.enrich_with(Arc::new(PropertyEnricher::new(name, value.into())))
    }

    pub fn write_to(mut self, sink: Arc<dyn Sink>) -> Self {
        self.sinks.push(sink);
        self
    }

    /// Build the concrete pipeline type.
    pub fn build_routing(self) -> Result<RoutingPipeline, BuildError> {
        if self.sinks.is_empty() {
            return Err(BuildError::NoSinks);
        }
        Ok(RoutingPipeline {
            destinations: Arc::new(Destinations {
                minimum_level: self.minimum_level,
                enrichers: self.enrichers,
                sinks: self.sinks,
                disposed: AtomicBool::new(false),
            }),
            context: Vec::new(),
        })
    }
}

impl PipelineBuilder for RoutingBuilder {
    fn build(self) -> Result<SharedPipeline, BuildError> {
        Ok(Arc::new(self.build_routing()?))
    }
}
