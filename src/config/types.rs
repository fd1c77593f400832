//! Core configuration types.
//! - Config holds runtime settings with sensible defaults.
//! - LogLevel represents verbosity with simple parsing helpers.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use super::paths;
use super::{COUNTDOWN_TICK, DEFAULT_COUNTDOWN};

/// Program-defined verbosity levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogLevel {
    /// Only errors
    Quiet,
    /// Notifications, countdown and farewell (default)
    #[default]
    Normal,
    /// Adds registration and setup details
    Info,
    /// Everything
    Debug,
}

impl LogLevel {
    /// Parse common string names into our LogLevel (case-insensitive).
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "quiet" | "error" | "none" => Some(LogLevel::Quiet),
            "normal" => Some(LogLevel::Normal),
            "info" | "verbose" | "detailed" => Some(LogLevel::Info),
            "debug" | "trace" => Some(LogLevel::Debug),
            _ => None,
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            LogLevel::Quiet => "quiet",
            LogLevel::Normal => "normal",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
        };
        f.write_str(s)
    }
}

impl FromStr for LogLevel {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| format!("invalid log level: '{s}'"))
    }
}

/// Runtime configuration for one run.
#[derive(Debug, Clone)]
pub struct Config {
    /// Countdown ticks after the shutdown request
    pub countdown: u32,
    /// Pause after each countdown line
    pub tick: Duration,
    /// Console and file verbosity
    pub log_level: LogLevel,
    /// Log file; `None` logs to stdout only
    pub log_file: Option<PathBuf>,
    /// Emit JSON lines instead of the compact format
    pub json: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            countdown: DEFAULT_COUNTDOWN,
            tick: COUNTDOWN_TICK,
            log_level: LogLevel::Normal,
            log_file: paths::default_log_path(),
            json: false,
        }
    }
}

impl Config {
    /// Config with an explicit countdown and no file logging.
    pub fn new(countdown: u32, tick: Duration) -> Self {
        Self {
            countdown,
            tick,
            log_file: None,
            ..Default::default()
        }
    }
}
