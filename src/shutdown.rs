//! Process-wide shutdown coordination.
//! `ShutdownSignal` is a manual-reset, cross-thread event: created unset,
//! set by the notification handler, waited on by the main flow.
//!
//! Notes:
//! - The state is monotonic. Once set it stays set, so a `set` that lands
//!   before anyone waits is never missed.
//! - `set` is idempotent and safe to call concurrently from any number of
//!   handler threads.
//! - Clones share one OS primitive; it is released when the last clone drops.

use std::io;
use std::sync::Arc;
use std::time::Duration;

use crate::platform::Event;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitOutcome {
    Signaled,
    TimedOut,
}

#[derive(Debug, Clone)]
pub struct ShutdownSignal {
    event: Arc<Event>,
    #[cfg(test)]
    set_error: Option<i32>,
    #[cfg(test)]
    wait_error: Option<i32>,
}

impl ShutdownSignal {
    /// Allocate a fresh, unset signal.
    pub fn create() -> io::Result<Self> {
        Ok(Self {
            event: Arc::new(Event::new()?),
            #[cfg(test)]
            set_error: None,
            #[cfg(test)]
            wait_error: None,
        })
    }

    /// Signal whose `set` fails with raw OS error `code`.
    #[cfg(test)]
    pub(crate) fn failing_set(code: i32) -> io::Result<Self> {
        Ok(Self { set_error: Some(code), ..Self::create()? })
    }

    /// Signal whose `wait` fails with raw OS error `code`.
    #[cfg(test)]
    pub(crate) fn failing_wait(code: i32) -> io::Result<Self> {
        Ok(Self { wait_error: Some(code), ..Self::create()? })
    }

    /// Request shutdown (idempotent). Wakes every blocked waiter.
    #[inline]
    pub fn set(&self) -> io::Result<()> {
        #[cfg(test)]
        if let Some(code) = self.set_error {
            return Err(io::Error::from_raw_os_error(code));
        }
        self.event.set()
    }

    /// Non-blocking check.
    pub fn is_set(&self) -> bool {
        matches!(self.wait(Some(Duration::ZERO)), Ok(WaitOutcome::Signaled))
    }

    /// Block until set or until `timeout` elapses. `None` waits forever.
    pub fn wait(&self, timeout: Option<Duration>) -> io::Result<WaitOutcome> {
        #[cfg(test)]
        if let Some(code) = self.wait_error {
            return Err(io::Error::from_raw_os_error(code));
        }
        if self.event.wait(timeout)? {
            Ok(WaitOutcome::Signaled)
        } else {
            Ok(WaitOutcome::TimedOut)
        }
    }

    /// Block with no timeout; returns only once set, or on error.
    pub fn wait_forever(&self) -> io::Result<()> {
        loop {
            if self.wait(None)? == WaitOutcome::Signaled {
                return Ok(());
            }
        }
    }
}
