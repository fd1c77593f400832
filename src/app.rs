//! Application orchestrator.
//! Loads config, initializes logging, then drives the main flow:
//! create the stop event, register the console handler, wait, count down,
//! say goodbye.
//!
//! Every fatal failure travels back as a `StopError` to a single exit point
//! that logs it once with its OS error code. The stop event is released when
//! the last handle to it drops.

use tracing::{debug, error, info};

use crate::cli::Args;
use crate::config::Config;
use crate::countdown;
use crate::errors::{ExitStatus, StopError};
use crate::handler::NotificationHandler;
use crate::host::{ControlHost, OsHost};
use crate::inspect::log_stream_diagnostics;
use crate::logging::init_tracing;
use crate::output as out;

/// Run the CLI application against the real OS.
pub fn run(args: &Args) -> ExitStatus {
    let cfg = Config::from_env(args.countdown());

    if let Err(e) = init_tracing(&cfg.log_level, cfg.log_file.as_deref(), cfg.json) {
        out::print_error(&format!("Failed to initialize logging: {e:#}"));
    }

    debug!(?cfg, "Starting graceful_stop");
    run_with(&cfg, &OsHost)
}

/// The main flow, against any host.
pub fn run_with<H: ControlHost + ?Sized>(cfg: &Config, host: &H) -> ExitStatus {
    log_stream_diagnostics(host);

    match wait_then_count_down(cfg, host) {
        Ok(()) => ExitStatus::SUCCESS,
        Err(e) => {
            let code = e.code();
            let source = std::error::Error::source(&e).map(ToString::to_string).unwrap_or_default();
            error!(code, kind = e.kind(), error = %source, "{e} with error code {code:#x}");
            ExitStatus::from(&e)
        }
    }
}

fn wait_then_count_down<H: ControlHost + ?Sized>(cfg: &Config, host: &H) -> Result<(), StopError> {
    let stop = host.create_signal().map_err(StopError::ResourceCreation)?;

    host.register(NotificationHandler::new(stop.clone())).map_err(StopError::Registration)?;
    info!("Running... press CTRL+C to terminate.");

    stop.wait_forever().map_err(StopError::Wait)?;

    countdown::run(cfg.countdown, cfg.tick);
    info!("Bye bye...");
    Ok(())
}
