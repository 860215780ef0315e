//! Derived (cached) facade.
//!
//! Holds the recipe for its view of the root pipeline (parent handle plus
//! extension) and a cache of the last pipeline it built, tagged with the root
//! generation it was built against. Nothing is derived at construction; the
//! first use resolves, later uses reuse the cache until the root's generation
//! moves on.
//!
//! Once the root is frozen, the first use derives from the final pipeline and
//! publishes the result in `frozen`; every later use reads it without locking.

use super::root::{RootFacade, RootState};
use super::{Generation, Logger};
use crate::error::FacadeError;
use crate::pipeline::{Extension, SharedPipeline};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, OnceLock};
use tracing::trace;

struct CachedPipeline {
    generation: Generation,
    pipeline: SharedPipeline,
}

pub struct DerivedFacade {
    root: Arc<RootFacade>,
    parent: Logger,
    extension: Extension,
    /// Update lock and cache. Unset until first resolution.
    cache: Mutex<Option<CachedPipeline>>,
    frozen: OnceLock<SharedPipeline>,
    derivations: AtomicU64,
}

impl DerivedFacade {
    pub(crate) fn new(
        root: Arc<RootFacade>,
        parent: Logger,
        extension: Extension,
    ) -> Self {
        Self {
            root,
            parent,
            extension,
            cache: Mutex::new(None),
            frozen: OnceLock::new(),
            derivations: AtomicU64::new(0),
        }
    }

    pub(crate) fn root(&self) -> &Arc<RootFacade> {
        &self.root
    }

    pub fn extension(&self) -> &Extension {
        &self.extension
    }

    pub fn is_frozen(&self) -> bool {
        self.frozen.get().is_some()
    }

    pub fn derivation_count(&self) -> u64 {
        self.derivations.load(Ordering::Relaxed)
    }

    pub(crate) fn with_pipeline<R>(
        &self,
        f: impl FnOnce(&SharedPipeline) -> R,
    ) -> Result<R, FacadeError> {
        if let Some(pipeline) = self.frozen.get() {
            self.root.ensure_live()?;
            return Ok(f(pipeline));
        }
        self.root.with_resolved(self, f)
    }

    /// Return the cached pipeline if it matches the root's current generation,
    /// otherwise re-derive from the parent and cache the result.
    ///
    /// The caller holds the root read lock. The cache lock is held across the
    /// re-derivation so concurrent first uses build only one pipeline. Lock
    /// order runs from child to parent, never the reverse.
    pub(crate) fn refresh(&self, state: &RootState) -> Result<SharedPipeline, FacadeError> {
        let current = state.current()?.generation;
        let mut cache = self.cache.lock();
        if let Some(cached) = cache.as_ref() {
            if cached.generation == current {
                return Ok(Arc::clone(&cached.pipeline));
            }
        }

        let base = self.parent.resolve_locked(state)?;
        let pipeline = self.extension.apply(base.as_ref());
        let stale = cache.as_ref().map(|cached| cached.generation);
        *cache = Some(CachedPipeline {
            generation: current,
            pipeline: Arc::clone(&pipeline),
        });
        self.derivations.fetch_add(1, Ordering::Relaxed);
        trace!(
            extension = self.extension.label(),
            generation = current.value(),
            stale = ?stale.map(|g| g.value()),
            "Derived pipeline refreshed"
        );
        Ok(pipeline)
    }

    /// Derive once from the root's final pipeline and keep it permanently.
    pub(crate) fn freeze_from(&self, final_pipeline: &SharedPipeline) -> SharedPipeline {
        let pipeline = self.frozen.get_or_init(|| {
            let base = self.parent.resolve_frozen(final_pipeline);
            self.derivations.fetch_add(1, Ordering::Relaxed);
            self.extension.apply(base.as_ref())
        });
        self.cache.lock().take();
        Arc::clone(pipeline)
    }
}
