//! Console control notification handling.
//!
//! The OS invokes [`NotificationHandler::handle`] on a thread of its own,
//! possibly several times and concurrently for different kinds. The handler
//! classifies the raw code, logs it, sets the shared [`ShutdownSignal`] and,
//! for Close/Logoff/Shutdown, never returns: on Windows returning "handled"
//! from those lets the OS terminate the process within seconds, which would
//! cut the countdown short.

use std::fmt;
use std::thread;

use tracing::{error, info};

use crate::platform::NOTIFICATION_CODES;
use crate::shutdown::ShutdownSignal;

/// Recognized control notifications.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NotificationKind {
    Interrupt,
    Break,
    Close,
    Logoff,
    Shutdown,
}

impl NotificationKind {
    pub const ALL: [NotificationKind; 5] = [
        NotificationKind::Interrupt,
        NotificationKind::Break,
        NotificationKind::Close,
        NotificationKind::Logoff,
        NotificationKind::Shutdown,
    ];

    /// Classify a raw platform code. `None` means "not ours".
    pub fn from_raw(raw: u32) -> Option<Self> {
        NOTIFICATION_CODES
            .iter()
            .find(|&&(_, code)| code == raw)
            .map(|&(kind, _)| kind)
    }

    /// Raw platform code for this kind, if the platform delivers it at all.
    pub fn raw(self) -> Option<u32> {
        NOTIFICATION_CODES
            .iter()
            .find(|&&(kind, _)| kind == self)
            .map(|&(_, code)| code)
    }

    /// Kinds after which the OS force-terminates a process shortly after the
    /// handler reports them as handled.
    #[inline]
    pub fn forces_termination(self) -> bool {
        matches!(self, NotificationKind::Close | NotificationKind::Logoff | NotificationKind::Shutdown)
    }
}

impl fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            NotificationKind::Interrupt => "Interrupt",
            NotificationKind::Break => "Break",
            NotificationKind::Close => "Close",
            NotificationKind::Logoff => "Logoff",
            NotificationKind::Shutdown => "Shutdown",
        })
    }
}

/// What the handler tells the OS.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    Handled,
    /// Let the default behavior (or the next handler in the chain) apply.
    NotHandled,
}

/// The registered callback. Holds its own clone of the shutdown signal.
#[derive(Debug, Clone)]
pub struct NotificationHandler {
    stop: ShutdownSignal,
}

impl NotificationHandler {
    pub fn new(stop: ShutdownSignal) -> Self {
        Self { stop }
    }

    /// Handle one raw notification.
    ///
    /// Does not return for kinds where [`NotificationKind::forces_termination`]
    /// holds; see [`park_forever`]. `NotHandled` means the code is not ours or
    /// the signal could not be set; the platform layer then falls back to the
    /// default action for that notification.
    pub fn handle(&self, raw: u32) -> Disposition {
        match self.signal_stop(raw) {
            Some(kind) if kind.forces_termination() => park_forever(),
            Some(_) => Disposition::Handled,
            None => Disposition::NotHandled,
        }
    }

    /// Log the notification and set the stop signal without ever stalling.
    /// Returns the recognized kind, or `None` for a foreign code or a failed set.
    pub fn signal_stop(&self, raw: u32) -> Option<NotificationKind> {
        let kind = NotificationKind::from_raw(raw)?;

        info!(%kind, code = raw, "Received the console {kind} notification, gracefully terminating the application...");

        if let Err(e) = self.stop.set() {
            error!(%kind, error = %e, "Failed to set the stop event");
            return None;
        }
        Some(kind)
    }
}

/// Block the calling thread permanently.
///
/// Used by handler threads for Close/Logoff/Shutdown: the OS only starts its
/// forced-termination timer once the callback returns, so the main flow keeps
/// running its countdown and ends the process itself. The stall is a
/// best-effort grace period; the OS may still kill the process after its own
/// timeout.
pub fn park_forever() -> ! {
    loop {
        thread::park();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{self, Write};
    use std::sync::{Arc, Mutex};
    use std::time::Duration;
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::{fmt as tsfmt, registry};

    use crate::shutdown::WaitOutcome;

    #[derive(Clone)]
    struct BufferWriter(Arc<Mutex<Vec<u8>>>);

    impl Write for BufferWriter {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }
        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    fn captured<R>(f: impl FnOnce() -> R) -> (R, String) {
        let buf = Arc::new(Mutex::new(Vec::new()));
        let make_writer = {
            let buf = buf.clone();
            move || BufferWriter(buf.clone())
        };
        let subscriber = registry().with(tsfmt::layer().with_writer(make_writer).with_ansi(false));
        let dispatch = tracing::Dispatch::new(subscriber);
        let out = tracing::dispatcher::with_default(&dispatch, f);
        let text = String::from_utf8_lossy(&buf.lock().unwrap()).to_string();
        (out, text)
    }

    #[test]
    fn classification_matches_platform_table() {
        for kind in NotificationKind::ALL {
            if let Some(raw) = kind.raw() {
                assert_eq!(NotificationKind::from_raw(raw), Some(kind));
            }
        }
        assert_eq!(NotificationKind::from_raw(u32::MAX), None);
    }

    #[test]
    fn only_close_logoff_shutdown_force_termination() {
        assert!(!NotificationKind::Interrupt.forces_termination());
        assert!(!NotificationKind::Break.forces_termination());
        assert!(NotificationKind::Close.forces_termination());
        assert!(NotificationKind::Logoff.forces_termination());
        assert!(NotificationKind::Shutdown.forces_termination());
    }

    #[test]
    fn unrecognized_code_passes_through_silently() {
        let stop = ShutdownSignal::create().unwrap();
        let handler = NotificationHandler::new(stop.clone());
        let (disposition, logs) = captured(|| handler.handle(u32::MAX));
        assert_eq!(disposition, Disposition::NotHandled);
        assert!(!stop.is_set());
        assert!(logs.is_empty(), "unexpected log output: {logs}");
    }

    #[test]
    fn interrupt_sets_signal_and_returns() {
        let stop = ShutdownSignal::create().unwrap();
        let handler = NotificationHandler::new(stop.clone());
        let raw = NotificationKind::Interrupt.raw().unwrap();
        let (disposition, logs) = captured(|| handler.handle(raw));
        assert_eq!(disposition, Disposition::Handled);
        assert!(stop.is_set());
        assert!(logs.contains("Received the console Interrupt notification"), "logs: {logs}");
    }

    #[test]
    fn repeated_break_is_harmless() {
        let stop = ShutdownSignal::create().unwrap();
        let handler = NotificationHandler::new(stop.clone());
        let raw = NotificationKind::Break.raw().unwrap();
        for _ in 0..3 {
            assert_eq!(handler.handle(raw), Disposition::Handled);
        }
        assert!(stop.is_set());
    }

    #[test]
    fn failed_set_is_reported_as_not_handled() {
        let stop = ShutdownSignal::failing_set(5).unwrap();
        let handler = NotificationHandler::new(stop.clone());
        let raw = NotificationKind::Close.raw().unwrap();
        // Close would park on success; a failed set returns instead.
        let (disposition, logs) = captured(|| handler.handle(raw));
        assert_eq!(disposition, Disposition::NotHandled);
        assert!(logs.contains("Failed to set the stop event"), "logs: {logs}");
    }

    #[test]
    fn signal_stop_never_stalls() {
        let stop = ShutdownSignal::create().unwrap();
        let handler = NotificationHandler::new(stop.clone());
        let raw = NotificationKind::Shutdown.raw().unwrap();
        assert_eq!(handler.signal_stop(raw), Some(NotificationKind::Shutdown));
        assert!(stop.is_set());
        assert_eq!(handler.signal_stop(u32::MAX), None);
    }

    #[test]
    fn close_sets_signal_and_never_returns() {
        let stop = ShutdownSignal::create().unwrap();
        let handler = NotificationHandler::new(stop.clone());
        let raw = NotificationKind::Close.raw().unwrap();
        let t = std::thread::spawn(move || handler.handle(raw));

        assert_eq!(stop.wait(Some(Duration::from_secs(10))).unwrap(), WaitOutcome::Signaled);
        std::thread::sleep(Duration::from_millis(100));
        assert!(!t.is_finished(), "handler thread returned after Close");
    }
}
