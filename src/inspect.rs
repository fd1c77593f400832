//! Standard stream introspection for startup diagnostics.
//! Reports whether stdin/stdout/stderr is a terminal, a disk file, a pipe or
//! a remote/socket endpoint. Purely informational: failures are logged as
//! warnings and never affect the exit status.

use std::fmt;
use std::path::PathBuf;

use tracing::{info, warn};

use crate::host::ControlHost;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StdStream {
    Stdin,
    Stdout,
    Stderr,
}

impl StdStream {
    pub const ALL: [StdStream; 3] = [StdStream::Stdin, StdStream::Stdout, StdStream::Stderr];

    /// Conventional descriptor number (0, 1, 2).
    #[cfg(unix)]
    pub fn fd(self) -> i32 {
        match self {
            StdStream::Stdin => 0,
            StdStream::Stdout => 1,
            StdStream::Stderr => 2,
        }
    }
}

impl fmt::Display for StdStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            StdStream::Stdin => "stdin",
            StdStream::Stdout => "stdout",
            StdStream::Stderr => "stderr",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamClass {
    Terminal,
    Disk,
    Pipe,
    Remote,
    Unknown,
}

impl fmt::Display for StreamClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            StreamClass::Terminal => "terminal",
            StreamClass::Disk => "disk file",
            StreamClass::Pipe => "pipe",
            StreamClass::Remote => "remote",
            StreamClass::Unknown => "unknown",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamInfo {
    pub stream: StdStream,
    pub class: StreamClass,
    /// Resolved name (device or file path) when the platform can tell.
    pub name: Option<PathBuf>,
}

/// Log one line per standard stream describing what it is attached to.
pub fn log_stream_diagnostics<H: ControlHost + ?Sized>(host: &H) {
    for stream in StdStream::ALL {
        match host.inspect(stream) {
            Ok(StreamInfo { class, name: Some(name), .. }) => {
                info!(%stream, %class, name = %name.display(), "{stream}: {class} ({})", name.display());
            }
            Ok(StreamInfo { class, name: None, .. }) => {
                info!(%stream, %class, "{stream}: {class}");
            }
            Err(e) => {
                warn!(%stream, error = %e, "Could not inspect {stream}");
            }
        }
    }
}
