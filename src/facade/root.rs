//! Root Reconfigurable Facade
//!
//! Owns the current pipeline and is the single source of truth derived facades
//! synchronize against.
//!
//! While unfrozen, every operation takes the root lock: shared for emitting and
//! resolving, exclusive for `reload`, `freeze` and `dispose`. `reload` swaps the
//! pipeline and disposes the old one under the same exclusive hold, so no reader
//! can still be using it. Derived facades are not notified; they compare their
//! cached generation with the current one the next time they are used.
//!
//! `freeze` publishes the final pipeline once. From then on reads test a flag
//! and use the published pipeline without locking.
//!
//! Records are emitted while the shared lock is held. A sink that writes back
//! through a facade of the same root would re-acquire it and can deadlock
//! against a waiting `reload`.

use super::derived::DerivedFacade;
use super::{Generation, Logger};
use crate::config::PipelineSettings;
use crate::error::FacadeError;
use crate::pipeline::{Extension, PipelineBuilder, RoutingBuilder, SharedPipeline};
use crate::sync::ScopedRwLock;
use std::sync::atomic::{fence, AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};
use tracing::debug;

/// A pipeline together with the generation it was installed as.
pub(crate) struct Installed {
    pub(crate) pipeline: SharedPipeline,
    pub(crate) generation: Generation,
}

/// State guarded by the root lock.
pub(crate) struct RootState {
    current: Option<Installed>,
    next_generation: u64,
}

impl RootState {
    /// The installed pipeline, or `Disposed` once the root has released it.
    pub(crate) fn current(&self) -> Result<&Installed, FacadeError> {
        self.current.as_ref().ok_or(FacadeError::Disposed)
    }

    fn install(&mut self, pipeline: SharedPipeline) -> (Generation, Option<Installed>) {
        let generation = Generation::new(self.next_generation);
        self.next_generation += 1;
        let previous = self.current.replace(Installed {
            pipeline,
            generation,
        });
        (generation, previous)
    }
}

/// The reconfigurable root. Construct once, hand out [`Logger`]s.
pub struct RootFacade {
    state: ScopedRwLock<RootState>,
    frozen: AtomicBool,
    final_pipeline: OnceLock<SharedPipeline>,
    disposed: AtomicBool,
}

impl RootFacade {
    /// Create a root around an already built pipeline.
    pub fn new(initial: SharedPipeline) -> Arc<Self> {
        let mut state = RootState {
            current: None,
            next_generation: 0,
        };
        state.install(initial);
        Arc::new(Self {
            state: ScopedRwLock::new(state),
            frozen: AtomicBool::new(false),
            final_pipeline: OnceLock::new(),
            disposed: AtomicBool::new(false),
        })
    }

    /// Create a root from a freshly configured builder.
    pub fn build<B, F>(configure: F) -> Result<Arc<Self>, FacadeError>
    where
        B: PipelineBuilder,
        F: FnOnce(B) -> B,
    {
        let pipeline = configure(B::default()).build()?;
        Ok(Self::new(pipeline))
    }

    /// Create a root from configuration settings.
    pub fn from_settings(settings: &PipelineSettings) -> Result<Arc<Self>, FacadeError> {
        settings.validate()?;
        Self::build(|builder: RoutingBuilder| settings.apply(builder))
    }

    /// Handle onto the root itself.
    pub fn logger(self: &Arc<Self>) -> Logger {
        Logger::root(Arc::clone(self))
    }

    pub fn is_frozen(&self) -> bool {
        self.frozen.load(Ordering::Acquire)
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed.load(Ordering::Acquire)
    }

    /// Generation of the pipeline currently installed.
    pub fn generation(&self) -> Result<Generation, FacadeError> {
        let state = self.state.acquire_read();
        Ok(state.current()?.generation)
    }

    /// Replace the pipeline with one built from a fresh `B`.
    ///
    /// All or nothing: if the build fails the previous pipeline stays current.
    /// On success the previous pipeline is disposed before the lock is released.
    pub fn reload<B, F>(&self, configure: F) -> Result<Generation, FacadeError>
    where
        B: PipelineBuilder,
        F: FnOnce(B) -> B,
    {
        let mut state = self.state.acquire_write();
        let previous = state.current()?.generation;
        if self.frozen.load(Ordering::Acquire) {
            return Err(FacadeError::AlreadyFrozen);
        }

        let pipeline = configure(B::default()).build()?;
        let (generation, replaced) = state.install(pipeline);
        if let Some(replaced) = replaced {
            replaced.pipeline.dispose();
        }
        debug!(
            previous = previous.value(),
            generation = generation.value(),
            "Pipeline reloaded"
        );
        Ok(generation)
    }

    /// Reload from configuration settings. Invalid settings leave the current
    /// pipeline in place.
    pub fn reload_from_settings(
        &self,
        settings: &PipelineSettings,
    ) -> Result<Generation, FacadeError> {
        settings.validate()?;
        self.reload(|builder: RoutingBuilder| settings.apply(builder))
    }

    /// Make the current pipeline permanent and stop locking.
    pub fn freeze(&self) -> Result<SharedPipeline, FacadeError> {
        let state = self.state.acquire_write();
        let installed = state.current()?;
        if self.frozen.load(Ordering::Acquire) {
            return Err(FacadeError::AlreadyFrozen);
        }

        let pipeline = Arc::clone(&installed.pipeline);
        if self.final_pipeline.set(Arc::clone(&pipeline)).is_err() {
            return Err(FacadeError::AlreadyFrozen);
        }
        self.frozen.store(true, Ordering::Release);
        fence(Ordering::SeqCst);

        debug!(generation = installed.generation.value(), "Pipeline frozen");
        Ok(pipeline)
    }

    /// Dispose the current pipeline. Later calls are no-ops.
    pub fn dispose(&self) {
        if self.disposed.swap(true, Ordering::AcqRel) {
            return;
        }
        let mut state = self.state.acquire_write();
        if let Some(installed) = state.current.take() {
            installed.pipeline.dispose();
            debug!(
                generation = installed.generation.value(),
                "Root facade disposed"
            );
        }
    }

    pub(crate) fn ensure_live(&self) -> Result<(), FacadeError> {
        if self.disposed.load(Ordering::Acquire) {
            Err(FacadeError::Disposed)
        } else {
            Ok(())
        }
    }

    /// The published final pipeline, if frozen.
    fn frozen_pipeline(&self) -> Option<&SharedPipeline> {
        if self.frozen.load(Ordering::Acquire) {
            self.final_pipeline.get()
        } else {
            None
        }
    }

    /// Run `f` against the root's own pipeline.
    pub(crate) fn with_current<R>(
        &self,
        f: impl FnOnce(&SharedPipeline) -> R,
    ) -> Result<R, FacadeError> {
        if let Some(pipeline) = self.frozen_pipeline() {
            self.ensure_live()?;
            return Ok(f(pipeline));
        }
        let state = self.state.acquire_read();
        let installed = state.current()?;
        Ok(f(&installed.pipeline))
    }

    /// Resolve `caller` against the current pipeline and run `f` on the result.
    ///
    /// Frozen: the caller derives once from the final pipeline and freezes
    /// itself. Unfrozen: under the shared root lock, the caller's own update
    /// lock decides between its cached pipeline and a re-derivation; `f` runs
    /// before the shared lock is released.
    pub(crate) fn with_resolved<R>(
        &self,
        caller: &DerivedFacade,
        f: impl FnOnce(&SharedPipeline) -> R,
    ) -> Result<R, FacadeError> {
        if let Some(final_pipeline) = self.frozen_pipeline() {
            self.ensure_live()?;
            let pipeline = caller.freeze_from(final_pipeline);
            return Ok(f(&pipeline));
        }
        let state = self.state.acquire_read();
        let pipeline = caller.refresh(&state)?;
        Ok(f(&pipeline))
    }

    /// Create a facade deriving from `parent`, which must belong to `root`.
    pub(crate) fn derive_child(
        root: &Arc<Self>,
        parent: Logger,
        extension: Extension,
    ) -> Result<Logger, FacadeError> {
        if let Some(final_pipeline) = root.frozen_pipeline() {
            root.ensure_live()?;
            let base = parent.resolve_frozen(final_pipeline);
            return Ok(Logger::fixed(
                Arc::clone(root),
                extension.apply(base.as_ref()),
            ));
        }
        root.ensure_live()?;
        Ok(Logger::derived(DerivedFacade::new(
            Arc::clone(root),
            parent,
            extension,
        )))
    }
}

impl Drop for RootFacade {
    fn drop(&mut self) {
        self.dispose();
    }
}
