//! Tracing initialization.
//! Builds a subscriber with EnvFilter, supports compact or JSON formats, and optional file logging.
//!
//! Behavior:
//! - Log level is driven by LogLevel (no RUST_LOG override here).
//! - Every line goes to stdout; if `log_file` is usable, also to that file.
//! - Timestamps use the local human format `DD/MM/YY HH:MM:SS`.
//!
//! Implementation notes:
//! - The file writer opens the log in append mode for each event and writes
//!   the formatted line in one call, so lines from the main flow and from
//!   notification threads never split. Nothing is buffered, so a forced
//!   termination loses no lines that were already logged.
//! - A failed open drops that line for the file only; logging never fails the caller.

use anyhow::{Context, Result};
use chrono::Local;
use std::fmt as stdfmt;
use std::fs::File;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing::Subscriber;
use tracing_subscriber::Layer;
use tracing_subscriber::filter::{EnvFilter, LevelFilter};
use tracing_subscriber::fmt as tsfmt;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::fmt::time::FormatTime;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::registry;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::util::SubscriberInitExt;

use crate::config::{LogLevel, default_log_path};
use crate::output as out;
use crate::platform::open_log_file_secure_append;

/// Human-friendly timestamp formatter (DD/MM/YY HH:MM:SS)
struct LocalHumanTime;
impl FormatTime for LocalHumanTime {
    fn format_time(&self, w: &mut tsfmt::format::Writer<'_>) -> stdfmt::Result {
        let now = Local::now();
        write!(w, "{}", now.format("%d/%m/%y %H:%M:%S"))
    }
}

#[inline]
fn to_level_filter(lvl: &LogLevel) -> LevelFilter {
    match lvl {
        LogLevel::Quiet => LevelFilter::ERROR,
        LogLevel::Normal => LevelFilter::INFO,
        LogLevel::Info => LevelFilter::DEBUG,
        LogLevel::Debug => LevelFilter::TRACE,
    }
}

#[inline]
fn env_filter_from_level(level_filter: LevelFilter) -> EnvFilter {
    let level_str = match level_filter {
        LevelFilter::ERROR => "error",
        LevelFilter::WARN => "warn",
        LevelFilter::INFO => "info",
        LevelFilter::DEBUG => "debug",
        LevelFilter::TRACE => "trace",
        _ => "info",
    };
    EnvFilter::new(level_str)
}

/// `MakeWriter` that appends each event to `path` through a freshly opened file.
#[derive(Debug, Clone)]
pub struct AppendPerLine {
    path: PathBuf,
}

impl AppendPerLine {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl<'a> MakeWriter<'a> for AppendPerLine {
    type Writer = LineSink;

    fn make_writer(&'a self) -> Self::Writer {
        LineSink(open_log_file_secure_append(&self.path).ok())
    }
}

/// One event's worth of output; discards silently when the open failed.
#[derive(Debug)]
pub struct LineSink(Option<File>);

impl Write for LineSink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match &mut self.0 {
            Some(f) => f.write(buf),
            None => Ok(buf.len()),
        }
    }

    fn write_all(&mut self, buf: &[u8]) -> io::Result<()> {
        match &mut self.0 {
            Some(f) => f.write_all(buf),
            None => Ok(()),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match &mut self.0 {
            Some(f) => f.flush(),
            None => Ok(()),
        }
    }
}

/// Probe the log path once so a bad location is reported up front.
fn usable_log_file(path: &Path) -> Option<AppendPerLine> {
    if let Some(parent) = path.parent() {
        let _ = std::fs::create_dir_all(parent);
    }
    match open_log_file_secure_append(path) {
        Ok(_) => Some(AppendPerLine::new(path)),
        Err(e) => {
            out::print_warn(&format!(
                "Requested file logging to '{}' was not enabled ({e}). Logs will continue to stdout.",
                path.display()
            ));
            if let Some(def) = default_log_path().filter(|def| def != path) {
                out::print_info(&format!("You can try using the default log path instead: {}", def.display()));
            }
            None
        }
    }
}

/// One formatting layer, compact or JSON, over any writer.
pub fn fmt_layer<S, W>(writer: W, json: bool, ansi: bool) -> Box<dyn Layer<S> + Send + Sync + 'static>
where
    S: Subscriber + for<'span> LookupSpan<'span> + 'static,
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    let base = tsfmt::layer()
        .with_timer(LocalHumanTime)
        .with_level(true)
        .with_target(false)
        .with_thread_names(true)
        .with_ansi(ansi)
        .with_writer(writer);
    if json { base.json().boxed() } else { base.compact().boxed() }
}

/// Initialize global tracing based on LogLevel and format.
pub fn init_tracing(lvl: &LogLevel, log_file: Option<&Path>, json: bool) -> Result<()> {
    let env_filter = env_filter_from_level(to_level_filter(lvl));
    let file_layer = log_file.and_then(usable_log_file).map(|w| fmt_layer(w, json, false));
    let stdout_ansi = atty::is(atty::Stream::Stdout);

    registry()
        .with(env_filter)
        .with(fmt_layer(io::stdout, json, stdout_ansi))
        .with(file_layer)
        .try_init()
        .context("a global tracing subscriber is already installed")
}
