//! Logging facilities.
//!
//! Mirrors the leveled, colorized, time-prefixed macros used throughout this lineage of
//! simulators, adapted for a kernel that has no notion of named components: the prefix carries
//! the virtual clock value instead of a component name.

use atty::Stream;
use colored::{Color, ColoredString, Colorize};

/// Applies the color to the string only if stderr (where `log` records land) goes to a console.
pub fn get_colored(s: &str, color: Color) -> ColoredString {
    if atty::is(Stream::Stderr) {
        s.color(color)
    } else {
        s.normal()
    }
}

/// Logs a message at the info level, prefixed with the current tick of `$clock` (any value with
/// a `now() -> Tick` method, such as [`crate::Scheduler`]).
#[macro_export]
macro_rules! log_info {
    ($clock:expr, $msg:expr) => (
        log::info!("[{:>6}] {} {}", $clock.now(), $crate::log::get_colored("INFO", $crate::log::Color::Green), $msg)
    );
    ($clock:expr, $format:expr, $($arg:tt)+) => (
        log::info!(concat!("[{:>6}] {} ", $format), $clock.now(), $crate::log::get_colored("INFO", $crate::log::Color::Green), $($arg)+)
    );
}

/// Logs a message at the debug level. See [`log_info!`](crate::log_info!).
#[macro_export]
macro_rules! log_debug {
    ($clock:expr, $msg:expr) => (
        log::debug!("[{:>6}] {} {}", $clock.now(), $crate::log::get_colored("DEBUG", $crate::log::Color::Blue), $msg)
    );
    ($clock:expr, $format:expr, $($arg:tt)+) => (
        log::debug!(concat!("[{:>6}] {} ", $format), $clock.now(), $crate::log::get_colored("DEBUG", $crate::log::Color::Blue), $($arg)+)
    );
}

/// Logs a message at the trace level. See [`log_info!`](crate::log_info!).
#[macro_export]
macro_rules! log_trace {
    ($clock:expr, $msg:expr) => (
        log::trace!("[{:>6}] {} {}", $clock.now(), $crate::log::get_colored("TRACE", $crate::log::Color::Cyan), $msg)
    );
    ($clock:expr, $format:expr, $($arg:tt)+) => (
        log::trace!(concat!("[{:>6}] {} ", $format), $clock.now(), $crate::log::get_colored("TRACE", $crate::log::Color::Cyan), $($arg)+)
    );
}

/// Logs a message at the warn level. See [`log_info!`](crate::log_info!).
#[macro_export]
macro_rules! log_warn {
    ($clock:expr, $msg:expr) => (
        log::warn!("[{:>6}] {} {}", $clock.now(), $crate::log::get_colored("WARN", $crate::log::Color::Yellow), $msg)
    );
    ($clock:expr, $format:expr, $($arg:tt)+) => (
        log::warn!(concat!("[{:>6}] {} ", $format), $clock.now(), $crate::log::get_colored("WARN", $crate::log::Color::Yellow), $($arg)+)
    );
}

/// Logs a message at the error level. See [`log_info!`](crate::log_info!).
#[macro_export]
macro_rules! log_error {
    ($clock:expr, $msg:expr) => (
        log::error!("[{:>6}] {} {}", $clock.now(), $crate::log::get_colored("ERROR", $crate::log::Color::Red), $msg)
    );
    ($clock:expr, $format:expr, $($arg:tt)+) => (
        log::error!(concat!("[{:>6}] {} ", $format), $clock.now(), $crate::log::get_colored("ERROR", $crate::log::Color::Red), $($arg)+)
    );
}

// Re-export so the macros above can refer to `$crate::log::Color` without callers needing to
// depend on `colored` directly.
pub use colored::Color;
