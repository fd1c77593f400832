//! The visible grace period between a shutdown request and exit.

use std::thread;
use std::time::Duration;

use tracing::info;

/// Remaining ticks, yielded from the start value down to 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Countdown {
    remaining: u32,
}

impl Countdown {
    pub fn new(start: u32) -> Self {
        Self { remaining: start }
    }

    #[inline]
    pub fn remaining(&self) -> u32 {
        self.remaining
    }
}

impl Iterator for Countdown {
    type Item = u32;

    fn next(&mut self) -> Option<u32> {
        if self.remaining == 0 {
            return None;
        }
        let current = self.remaining;
        self.remaining -= 1;
        Some(current)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let n = self.remaining as usize;
        (n, Some(n))
    }
}

impl ExactSizeIterator for Countdown {}

/// Log each remaining value and sleep one `tick` after it. Blocks the caller.
pub fn run(start: u32, tick: Duration) {
    for remaining in Countdown::new(start) {
        info!(remaining, "Gracefully terminating the application in T-{remaining}...");
        thread::sleep(tick);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    #[test]
    fn yields_start_down_to_one() {
        let ticks: Vec<u32> = Countdown::new(3).collect();
        assert_eq!(ticks, vec![3, 2, 1]);
    }

    #[test]
    fn zero_yields_nothing() {
        let mut c = Countdown::new(0);
        assert_eq!(c.len(), 0);
        assert_eq!(c.next(), None);
        assert_eq!(c.remaining(), 0);
    }

    #[test]
    fn stays_terminal_at_zero() {
        let mut c = Countdown::new(1);
        assert_eq!(c.next(), Some(1));
        assert_eq!(c.next(), None);
        assert_eq!(c.next(), None);
    }

    #[test]
    fn run_sleeps_one_tick_per_value() {
        let started = Instant::now();
        run(3, Duration::from_millis(20));
        assert!(started.elapsed() >= Duration::from_millis(60));
    }
}
