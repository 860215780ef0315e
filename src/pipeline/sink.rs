//! Destinations a [`RoutingPipeline`](super::RoutingPipeline) writes to.

use crate::record::{Level, Record};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

/// A destination for records. May own resources released by `dispose`.
pub trait Sink: Send + Sync {
    fn emit(&self, record: &Record);

    fn dispose(&self) {}
}

/// Discards everything.
#[derive(Debug, Default)]
pub struct NullSink;

impl Sink for NullSink {
    fn emit(&self, _record: &Record) {}
}

/// `tracing` target of forwarded records.
pub const RECORD_TARGET: &str = "hotroute::record";

/// Forwards records into `tracing` under [`RECORD_TARGET`].
#[derive(Debug, Default)]
pub struct TracingSink;

impl Sink for TracingSink {
    fn emit(&self, record: &Record) {
        let message = record.message();
        let properties = serde_json::to_string(&record.properties).unwrap_or_default();
        match record.level {
            Level::Trace => {
                tracing::trace!(target: RECORD_TARGET, %properties, "{}", message)
            }
            Level::Debug => {
                tracing::debug!(target: RECORD_TARGET, %properties, "{}", message)
            }
            Level::Info => {
                tracing::info!(target: RECORD_TARGET, %properties, "{}", message)
            }
            Level::Warn => {
                tracing::warn!(target: RECORD_TARGET, %properties, "{}", message)
            }
            Level::Error | Level::Fatal => {
                tracing::error!(target: RECORD_TARGET, level = %record.level, %properties, "{}", message)
            }
        }
    }
}

/// In-memory sink that counts writes, optionally keeps them, and tracks
/// disposal. Writes that arrive after `dispose` are counted separately.
#[derive(Debug, Default)]
pub struct MemorySink {
    retain: bool,
    records: Mutex<Vec<Record>>,
    received: AtomicU64,
    received_after_dispose: AtomicU64,
    dispose_calls: AtomicU64,
    disposed: AtomicBool,
}

impl MemorySink {
    /// Count-only sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sink that also keeps every record it receives.
    pub fn retaining() -> Self {
        Self {
            retain: true,
            ..Self::default()
        }
    }

    pub fn received(&self) -> u64 {
        self.received.load(Ordering::SeqCst)
    }

    pub fn received_after_dispose(&self) -> u64 {
        self.received_after_dispose.load(Ordering::SeqCst)
    }

    pub fn dispose_calls(&self) -> u64 {
        self.dispose_calls.load(Ordering::SeqCst)
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed.load(Ordering::SeqCst)
    }

    /// Snapshot of retained records.
    pub fn records(&self) -> Vec<Record> {
        self.records.lock().clone()
    }
}

impl Sink for MemorySink {
    fn emit(&self, record: &Record) {
        if self.disposed.load(Ordering::SeqCst) {
            self.received_after_dispose.fetch_add(1, Ordering::SeqCst);
            return;
        }
        self.received.fetch_add(1, Ordering::SeqCst);
        if self.retain {
            self.records.lock().push(record.clone());
        }
    }

    fn dispose(&self) {
        self.dispose_calls.fetch_add(1, Ordering::SeqCst);
        self.disposed.store(true, Ordering::SeqCst);
    }
}
