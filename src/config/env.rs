//! Environment overrides.
//!
//! - `GRACEFUL_STOP_LOG_FILE`: log file path; an empty value disables file logging
//! - `GRACEFUL_STOP_LOG_LEVEL`: quiet, normal, info, debug (invalid values are ignored)
//! - `GRACEFUL_STOP_LOG_FORMAT`: `json` for JSON lines, anything else for compact

use std::path::PathBuf;

use super::types::{Config, LogLevel};
use crate::output as out;

pub const ENV_LOG_FILE: &str = "GRACEFUL_STOP_LOG_FILE";
pub const ENV_LOG_LEVEL: &str = "GRACEFUL_STOP_LOG_LEVEL";
pub const ENV_LOG_FORMAT: &str = "GRACEFUL_STOP_LOG_FORMAT";

impl Config {
    /// Defaults, then the process environment, with `countdown` from the CLI.
    pub fn from_env(countdown: u32) -> Self {
        Self::from_lookup(countdown, |key| std::env::var(key).ok())
    }

    /// Same as [`Config::from_env`] with an injectable variable lookup.
    pub fn from_lookup(countdown: u32, lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut cfg = Config {
            countdown,
            ..Default::default()
        };

        if let Some(path) = lookup(ENV_LOG_FILE) {
            cfg.log_file = if path.trim().is_empty() {
                None
            } else {
                Some(PathBuf::from(path))
            };
        }

        if let Some(raw) = lookup(ENV_LOG_LEVEL) {
            match LogLevel::parse(&raw) {
                Some(level) => cfg.log_level = level,
                None => out::print_warn(&format!(
                    "Ignoring {ENV_LOG_LEVEL}='{raw}'; expected quiet, normal, info or debug"
                )),
            }
        }

        if let Some(format) = lookup(ENV_LOG_FORMAT) {
            cfg.json = format.trim().eq_ignore_ascii_case("json");
        }

        cfg
    }
}
