//! Snapshot facade, kept as a comparison baseline.
//!
//! Readers clone the current pipeline under a momentary read lock and emit with
//! no lock held. `reload` swaps and disposes the old pipeline immediately, so an
//! emitter holding an older snapshot can still write into a disposed pipeline.
//! That race is accepted here; [`RootFacade`](super::RootFacade) is the
//! implementation that rules it out.

use crate::error::FacadeError;
use crate::pipeline::{PipelineBuilder, SharedPipeline};
use crate::record::{Level, Record};
use crate::sync::ScopedRwLock;
use std::sync::Arc;

pub struct SnapshotFacade {
    current: ScopedRwLock<SharedPipeline>,
}

impl SnapshotFacade {
    pub fn new(initial: SharedPipeline) -> Self {
        Self {
            current: ScopedRwLock::new(initial),
        }
    }

    fn snapshot(&self) -> SharedPipeline {
        Arc::clone(&*self.current.acquire_read())
    }

    pub fn emit(&self, record: Record) {
        self.snapshot().emit(record);
    }

    pub fn is_enabled(&self, level: Level) -> bool {
        self.snapshot().is_enabled(level)
    }

    pub fn reload<B, F>(&self, configure: F) -> Result<(), FacadeError>
    where
        B: PipelineBuilder,
        F: FnOnce(B) -> B,
    {
        let next = configure(B::default()).build()?;
        let previous = std::mem::replace(&mut *self.current.acquire_write(), next);
        previous.dispose();
        Ok(())
    }

    pub fn dispose(&self) {
        self.current.acquire_read().dispose();
    }
}
