//! Config module.
//! Provides configuration types, the default log path, and environment loading.
//! The countdown length comes from the command line; everything else comes
//! from `GRACEFUL_STOP_*` environment variables.

mod env;
pub mod paths;
pub mod types;

pub use env::{ENV_LOG_FILE, ENV_LOG_FORMAT, ENV_LOG_LEVEL};
pub use paths::default_log_path;
pub use types::{Config, LogLevel};

/// Countdown length used when no single argument is given.
pub const DEFAULT_COUNTDOWN: u32 = 10;
/// Time between countdown lines.
pub const COUNTDOWN_TICK: std::time::Duration = std::time::Duration::from_secs(1);
