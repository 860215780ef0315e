//! Error types for the hotroute reconfigurable facade.

use thiserror::Error;

/// Errors raised while materializing a pipeline from a builder.
#[derive(Debug, Error)]
pub enum BuildError {
    #[error("Pipeline has no destinations configured")]
    NoSinks,

    #[error("Sink construction failed: {0}")]
    Sink(String),
}

/// Errors surfaced by facades and the root reconfiguration operations.
#[derive(Debug, Error)]
pub enum FacadeError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Facade is frozen; the pipeline can no longer be replaced")]
    AlreadyFrozen,

    #[error("Facade has been disposed")]
    Disposed,

    #[error("Pipeline build failed: {0}")]
    Build(#[from] BuildError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("A global logger is already installed")]
    GlobalAlreadyInstalled,
}

impl From<config::ConfigError> for FacadeError {
    fn from(err: config::ConfigError) -> Self {
        FacadeError::Config(err.to_string())
    }
}
