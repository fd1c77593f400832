//! Default path helpers.
//! Determines the OS-appropriate log file location.

use dirs::data_dir;
use std::fs;
use std::path::PathBuf;

/// OS-appropriate default log file path (data dir).
pub fn default_log_path() -> Option<PathBuf> {
    if let Some(mut base) = data_dir() {
        base.push("graceful_stop");
        // ensure dir exists (best-effort)
        let _ = fs::create_dir_all(&base);
        base.push("graceful_stop.log");
        Some(base)
    } else {
        std::env::var("HOME").ok().map(|h| {
            PathBuf::from(h)
                .join(".local")
                .join("share")
                .join("graceful_stop")
                .join("graceful_stop.log")
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_log_file_name() {
        if let Some(p) = default_log_path() {
            assert_eq!(p.file_name().unwrap(), "graceful_stop.log");
            assert_eq!(p.parent().unwrap().file_name().unwrap(), "graceful_stop");
        }
    }
}
