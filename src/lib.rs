//! Hotroute: Reconfigurable Record Routing
//!
//! A stable [`Logger`](facade::Logger) handle whose underlying pipeline can be
//! replaced at runtime. Handles obtained earlier keep working, derived handles
//! pick up the new pipeline lazily, and no handle writes into a pipeline that
//! has already been disposed.

pub mod cli;
pub mod config;
pub mod error;
pub mod facade;
pub mod global;
pub mod logging;
pub mod pipeline;
pub mod record;
pub mod sync;
pub mod watch;

pub use error::{BuildError, FacadeError};
pub use facade::{Facade, Generation, Logger, RootFacade};
pub use pipeline::{Extension, Pipeline, PipelineBuilder, SharedPipeline};
pub use record::{Level, Record};
