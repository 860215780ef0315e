//! Facades
//!
//! A [`Logger`] is the stable handle callers hold. It is backed by one of:
//!
//! - the [`RootFacade`], which owns the current pipeline and is the only place
//!   reconfiguration happens (`reload`, `freeze`, `dispose`);
//! - a [`DerivedFacade`], which adds fixed context and caches the pipeline it
//!   derived from the root, re-deriving lazily when the root's generation moves;
//! - a fixed pipeline, produced by deriving after the root was frozen, when
//!   nothing can change any more and no cache is needed.
//!
//! Every handle keeps its root alive so that use after `dispose` fails with
//! [`FacadeError::Disposed`] instead of writing into released destinations.

use crate::error::FacadeError;
use crate::pipeline::{Extension, SharedPipeline};
use crate::record::{BoundTemplate, Level, MessageTemplate, Record};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

pub mod derived;
pub mod root;
pub mod snapshot;

pub use derived::DerivedFacade;
pub use root::RootFacade;
pub use snapshot::SnapshotFacade;

use root::RootState;

/// Identity of a pipeline installed into a root. Strictly increasing per root.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Generation(u64);

impl Generation {
    pub(crate) fn new(value: u64) -> Self {
        Self(value)
    }

    pub fn value(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for Generation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "gen-{}", self.0)
    }
}

/// Capabilities every facade offers.
pub trait Facade: Send + Sync {
    fn emit(&self, record: Record) -> Result<(), FacadeError>;

    fn is_enabled(&self, level: Level) -> Result<bool, FacadeError>;

    /// Parse `template` and bind `args`. `Ok(None)` when the pipeline declines
    /// the template.
    fn bind_template(
        &self,
        template: &str,
        args: &[Value],
    ) -> Result<Option<BoundTemplate>, FacadeError>;

    /// A facade that adds `extension` to every record written through it.
    fn derive(&self, extension: Extension) -> Result<Logger, FacadeError>;

    /// Check the level, bind the template and emit. Binding is skipped when
    /// the level is disabled; a declined template is emitted verbatim.
    fn write(&self, level: Level, template: &str, args: &[Value]) -> Result<(), FacadeError> {
        if !self.is_enabled(level)? {
            return Ok(());
        }
        let bound = match self.bind_template(template, args)? {
            Some(bound) => bound,
            None => BoundTemplate {
                template: MessageTemplate::literal(template),
                properties: BTreeMap::new(),
            },
        };
        self.emit(Record::new(level, bound))
    }
}

#[derive(Clone)]
enum Node {
    Root(Arc<RootFacade>),
    Derived(Arc<DerivedFacade>),
    Fixed {
        root: Arc<RootFacade>,
        pipeline: SharedPipeline,
    },
}

/// Cheap-to-clone handle onto a root, derived or fixed facade.
#[derive(Clone)]
pub struct Logger {
    node: Node,
}

impl Logger {
    pub(crate) fn root(root: Arc<RootFacade>) -> Self {
        Self {
            node: Node::Root(root),
        }
    }

    pub(crate) fn derived(facade: DerivedFacade) -> Self {
        Self {
            node: Node::Derived(Arc::new(facade)),
        }
    }

    pub(crate) fn fixed(root: Arc<RootFacade>, pipeline: SharedPipeline) -> Self {
        Self {
            node: Node::Fixed { root, pipeline },
        }
    }

    fn root_facade(&self) -> &Arc<RootFacade> {
        match &self.node {
            Node::Root(root) => root,
            Node::Derived(derived) => derived.root(),
            Node::Fixed { root, .. } => root,
        }
    }

    /// Run `f` against this handle's current pipeline.
    pub fn with_pipeline<R>(
        &self,
        f: impl FnOnce(&SharedPipeline) -> R,
    ) -> Result<R, FacadeError> {
        match &self.node {
            Node::Root(root) => root.with_current(f),
            Node::Derived(derived) => derived.with_pipeline(f),
            Node::Fixed { root, pipeline } => {
                root.ensure_live()?;
                Ok(f(pipeline))
            }
        }
    }

    /// The pipeline instance this handle currently resolves to.
    pub fn pipeline(&self) -> Result<SharedPipeline, FacadeError> {
        self.with_pipeline(Arc::clone)
    }

    /// Whether this handle no longer consults the root lock.
    pub fn is_frozen(&self) -> bool {
        match &self.node {
            Node::Root(root) => root.is_frozen(),
            Node::Derived(derived) => derived.is_frozen(),
            Node::Fixed { .. } => true,
        }
    }

    /// How many times this handle built its pipeline from its parent's.
    /// Always zero for the root and fixed handles.
    pub fn derivation_count(&self) -> u64 {
        match &self.node {
            Node::Derived(derived) => derived.derivation_count(),
            _ => 0,
        }
    }

    /// Effective pipeline while the caller holds the root read lock.
    pub(crate) fn resolve_locked(&self, state: &RootState) -> Result<SharedPipeline, FacadeError> {
        match &self.node {
            Node::Root(_) => Ok(Arc::clone(&state.current()?.pipeline)),
            Node::Derived(derived) => derived.refresh(state),
            Node::Fixed { pipeline, .. } => Ok(Arc::clone(pipeline)),
        }
    }

    /// Effective pipeline once the root is frozen on `final_pipeline`.
    pub(crate) fn resolve_frozen(&self, final_pipeline: &SharedPipeline) -> SharedPipeline {
        match &self.node {
            Node::Root(_) => Arc::clone(final_pipeline),
            Node::Derived(derived) => derived.freeze_from(final_pipeline),
            Node::Fixed { pipeline, .. } => Arc::clone(pipeline),
        }
    }
}

impl Facade for Logger {
    fn emit(&self, record: Record) -> Result<(), FacadeError> {
        self.with_pipeline(|pipeline| pipeline.emit(record))
    }

    fn is_enabled(&self, level: Level) -> Result<bool, FacadeError> {
        self.with_pipeline(|pipeline| pipeline.is_enabled(level))
    }

    fn bind_template(
        &self,
        template: &str,
        args: &[Value],
    ) -> Result<Option<BoundTemplate>, FacadeError> {
        self.with_pipeline(|pipeline| pipeline.bind_template(template, args))
    }

    fn derive(&self, extension: Extension) -> Result<Logger, FacadeError> {
        match &self.node {
            Node::Fixed { root, pipeline } => {
                root.ensure_live()?;
                Ok(Logger::fixed(
                    Arc::clone(root),
                    extension.apply(pipeline.as_ref()),
                ))
            }
            _ => {
                let root = Arc::clone(self.root_facade());
                RootFacade::derive_child(&root, self.clone(), extension)
            }
        }
    }
}

impl fmt::Debug for Logger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.node {
            Node::Root(_) => f.write_str("Logger::Root"),
            Node::Derived(derived) => f
                .debug_struct("Logger::Derived")
                .field("extension", derived.extension())
                .field("frozen", &derived.is_frozen())
                .finish(),
            Node::Fixed { .. } => f.write_str("Logger::Fixed"),
        }
    }
}
