//! The seam between the main flow and the operating system.
//! `OsHost` is the real thing; tests substitute their own host to simulate
//! notifications and primitive failures.

use std::io;

use crate::handler::NotificationHandler;
use crate::inspect::{StdStream, StreamInfo};
use crate::platform;
use crate::shutdown::ShutdownSignal;

pub trait ControlHost {
    /// Allocate the shared stop primitive.
    fn create_signal(&self) -> io::Result<ShutdownSignal>;

    /// Hand the handler to the OS notification mechanism. The host may invoke
    /// it later from any thread, any number of times.
    fn register(&self, handler: NotificationHandler) -> io::Result<()>;

    /// Describe a standard stream (diagnostics only).
    fn inspect(&self, stream: StdStream) -> io::Result<StreamInfo>;
}

/// Console control notifications and primitives of the running OS.
#[derive(Debug, Clone, Copy, Default)]
pub struct OsHost;

impl ControlHost for OsHost {
    fn create_signal(&self) -> io::Result<ShutdownSignal> {
        ShutdownSignal::create()
    }

    fn register(&self, handler: NotificationHandler) -> io::Result<()> {
        platform::register_console_handler(handler)
    }

    fn inspect(&self, stream: StdStream) -> io::Result<StreamInfo> {
        platform::inspect_stream(stream)
    }
}
