//! Small wrapper around stdout/stderr printing for messages that must reach
//! the user even when tracing is not (yet) set up. Colors are enabled only
//! when the target stream is a TTY.

use owo_colors::OwoColorize;

pub fn print_info(msg: &str) {
    if atty::is(atty::Stream::Stdout) {
        println!("{} {}", "info:".cyan().bold(), msg);
    } else {
        println!("info: {}", msg);
    }
}

pub fn print_warn(msg: &str) {
    if atty::is(atty::Stream::Stderr) {
        eprintln!("{} {}", "warn:".yellow().bold(), msg);
    } else {
        eprintln!("warn: {}", msg);
    }
}

pub fn print_error(msg: &str) {
    if atty::is(atty::Stream::Stderr) {
        eprintln!("{} {}", "error:".red().bold(), msg);
    } else {
        eprintln!("error: {}", msg);
    }
}
