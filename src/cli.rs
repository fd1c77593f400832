//! CLI definition and parsing.
//! Defines Args and provides parse() for command-line handling.
//!
//! Notes:
//! - The only input is an optional countdown length in seconds.
//! - It is honored only when it is the sole argument; any other argument
//!   count falls back to the default.
//! - The value is read like C `atoi`: leading digits count, anything else is 0.

use clap::Parser;

use crate::config::DEFAULT_COUNTDOWN;

/// Wait for a console control notification (Ctrl+C, Ctrl+Break, close,
/// logoff, shutdown), then count down and exit.
#[derive(Parser, Debug, Clone)]
#[command(author, version, about = "Wait for a console control notification, then count down and exit")]
pub struct Args {
    /// Countdown length in seconds (default 10). Used only when given alone.
    #[arg(value_name = "SECONDS", trailing_var_arg = true, allow_hyphen_values = true, allow_negative_numbers = true)]
    pub rest: Vec<String>,
}

impl Args {
    /// Effective countdown length.
    pub fn countdown(&self) -> u32 {
        match self.rest.as_slice() {
            [only] => parse_countdown(only),
            _ => DEFAULT_COUNTDOWN,
        }
    }
}

/// Parse the leading integer of `text`: optional whitespace and sign, then
/// digits. Non-numeric input yields 0, negative values clamp to 0 and
/// overflow saturates.
pub fn parse_countdown(text: &str) -> u32 {
    let s = text.trim_start();
    let (negative, digits) = match s.as_bytes().first() {
        Some(b'-') => (true, &s[1..]),
        Some(b'+') => (false, &s[1..]),
        _ => (false, s),
    };
    let value = digits
        .bytes()
        .take_while(u8::is_ascii_digit)
        .fold(0u32, |acc, d| acc.saturating_mul(10).saturating_add(u32::from(d - b'0')));
    if negative { 0 } else { value }
}

pub fn parse() -> Args {
    Args::parse()
}
