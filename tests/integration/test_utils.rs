//! Shared test utilities for integration tests
//!
//! `Buckets` hands out one counting sink per pipeline generation so tests can
//! tell which pipeline a record was routed to.

#![allow(dead_code)]

use hotroute::pipeline::{MemorySink, RoutingBuilder};
use hotroute::{Generation, Level, RootFacade};
use std::sync::{Arc, Mutex};

/// One `MemorySink` per generation, in creation order.
#[derive(Default)]
pub struct Buckets {
    sinks: Mutex<Vec<Arc<MemorySink>>>,
    retain: bool,
}

impl Buckets {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn retaining() -> Arc<Self> {
        Arc::new(Self {
            retain: true,
            ..Self::default()
        })
    }

    /// Create the sink for the next generation.
    pub fn next(&self) -> Arc<MemorySink> {
        let sink = Arc::new(if self.retain {
            MemorySink::retaining()
        } else {
            MemorySink::new()
        });
        self.sinks.lock().unwrap().push(Arc::clone(&sink));
        sink
    }

    pub fn get(&self, index: usize) -> Arc<MemorySink> {
        Arc::clone(&self.sinks.lock().unwrap()[index])
    }

    pub fn len(&self) -> usize {
        self.sinks.lock().unwrap().len()
    }

    pub fn total_received(&self) -> u64 {
        self.sinks.lock().unwrap().iter().map(|s| s.received()).sum()
    }

    pub fn total_after_dispose(&self) -> u64 {
        self.sinks
            .lock()
            .unwrap()
            .iter()
            .map(|s| s.received_after_dispose())
            .sum()
    }

    pub fn all_disposed_once(&self) -> bool {
        self.sinks
            .lock()
            .unwrap()
            .iter()
            .all(|s| s.dispose_calls() == 1)
    }
}

/// Root writing every level into a fresh bucket.
pub fn root_with_bucket(buckets: &Buckets) -> Arc<RootFacade> {
    let sink = buckets.next();
    RootFacade::build(move |b: RoutingBuilder| b.minimum_level(Level::Trace).write_to(sink))
        .unwrap()
}

/// Reload `root` onto a fresh bucket.
pub fn reload_to_next(root: &RootFacade, buckets: &Buckets) -> Generation {
    let sink = buckets.next();
    root.reload(move |b: RoutingBuilder| b.minimum_level(Level::Trace).write_to(sink))
        .unwrap()
}
