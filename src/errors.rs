//! Typed error definitions for graceful_stop.
//! Every variant is fatal: it is logged once with its OS error code and the
//! process exits with that code.

use std::io;
use thiserror::Error;

use crate::platform::os_error_code;

#[derive(Debug, Error)]
pub enum StopError {
    #[error("Failed to create the stop event")]
    ResourceCreation(#[source] io::Error),

    #[error("Failed to set the console control handler")]
    Registration(#[source] io::Error),

    #[error("Failed to wait for the stop event")]
    Wait(#[source] io::Error),
}

impl StopError {
    /// Process exit code derived from the underlying OS error. Never 0.
    pub fn code(&self) -> i32 {
        os_error_code(self.source_io())
    }

    /// Short machine-friendly tag used as a structured log field.
    pub fn kind(&self) -> &'static str {
        match self {
            StopError::ResourceCreation(_) => "resource_creation",
            StopError::Registration(_) => "registration",
            StopError::Wait(_) => "wait",
        }
    }

    fn source_io(&self) -> &io::Error {
        match self {
            StopError::ResourceCreation(e) | StopError::Registration(e) | StopError::Wait(e) => e,
        }
    }
}

/// Final outcome of a run, handed to `std::process::exit`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExitStatus(i32);

impl ExitStatus {
    pub const SUCCESS: ExitStatus = ExitStatus(0);

    #[inline]
    pub fn code(self) -> i32 {
        self.0
    }

    #[inline]
    pub fn is_success(self) -> bool {
        self.0 == 0
    }
}

impl From<&StopError> for ExitStatus {
    fn from(err: &StopError) -> Self {
        ExitStatus(err.code())
    }
}
