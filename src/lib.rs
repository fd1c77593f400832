//! Core library for `graceful_stop`.
//!
//! A console program that idles until the OS delivers a control notification
//! (Ctrl+C, Ctrl+Break, console close, logoff, shutdown), then runs a visible
//! countdown and exits on its own terms.
//!
//! The pieces:
//! - [`shutdown::ShutdownSignal`]: manual-reset event shared by both flows
//! - [`handler::NotificationHandler`]: the callback the OS runs on its own thread
//! - [`app::run_with`]: the main flow (wait, count down, exit)
//! - [`host::ControlHost`]: the OS seam, replaceable in tests
pub mod app;
pub mod cli;
pub mod config;
pub mod countdown;
pub mod errors;
pub mod handler;
pub mod host;
pub mod inspect;
pub mod logging;
pub mod output;
pub mod platform;
pub mod shutdown;

pub use config::{Config, LogLevel, default_log_path};
pub use errors::{ExitStatus, StopError};
pub use handler::{Disposition, NotificationHandler, NotificationKind};
pub use host::{ControlHost, OsHost};
pub use shutdown::{ShutdownSignal, WaitOutcome};
