//! Process-wide logger access point.
//!
//! Optional convenience for code that cannot have a [`Logger`] passed to it.
//! The installed handle is an ordinary facade; reloads and freezing still go
//! through its root.

use crate::error::FacadeError;
use crate::facade::Logger;
use std::sync::OnceLock;

static GLOBAL: OnceLock<Logger> = OnceLock::new();

/// Install the process-wide logger. Only the first call succeeds.
pub fn install(logger: Logger) -> Result<(), FacadeError> {
    GLOBAL
        .set(logger)
        .map_err(|_| FacadeError::GlobalAlreadyInstalled)
}

/// The installed logger, if any.
pub fn logger() -> Option<&'static Logger> {
    GLOBAL.get()
}
