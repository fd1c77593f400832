//! Platform-specific helpers.
//! This module hides OS differences (Unix/Windows) behind a uniform API so
//! the rest of the codebase can remain platform-agnostic:
//! - `Event`: the manual-reset wait primitive behind `ShutdownSignal`
//! - `register_console_handler`: hooks a `NotificationHandler` into the OS
//!   control-notification mechanism
//! - `inspect_stream`: classifies a standard stream for startup diagnostics
//! - `open_log_file_secure_append`, `os_error_code`

#[cfg(unix)]
mod unix;
#[cfg(windows)]
mod windows;

#[cfg(unix)]
pub use unix::{
    Event, NOTIFICATION_CODES, inspect_stream, open_log_file_secure_append, os_error_code,
    register_console_handler,
};

#[cfg(windows)]
pub use windows::{
    Event, NOTIFICATION_CODES, inspect_stream, open_log_file_secure_append, os_error_code,
    register_console_handler,
};
