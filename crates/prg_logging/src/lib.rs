#![deny(missing_docs)]
//! Shared logging utilities for the PRG watch workspace.
//!
//! Every crate logs through the `engine_*` macros below. Messages emitted on
//! the scan thread carry the number of the pass that produced them, so a log
//! file can be read back pass by pass.

use std::cell::Cell;

thread_local! {
    /// Scan pass currently running on this thread, 0 outside the scan loop.
    static SCAN_PASS: Cell<u64> = const { Cell::new(0) };
}

/// Records the scan pass now running on the current thread.
/// The scan loop calls this once at the start of every pass.
pub fn set_scan_pass(pass: u64) {
    SCAN_PASS.with(|v| v.set(pass));
}

/// Returns the scan pass recorded for the current thread, or 0.
pub fn scan_pass() -> u64 {
    SCAN_PASS.with(|v| v.get())
}

#[doc(hidden)]
pub fn pass_prefix() -> String {
    match scan_pass() {
        0 => String::new(),
        pass => format!("[pass {pass}] "),
    }
}

/// Logs a trace-level message, prefixed with the current scan pass.
#[macro_export]
macro_rules! engine_trace {
    ($($arg:tt)*) => {{
        log::trace!("{}{}", $crate::pass_prefix(), format_args!($($arg)*));
    }};
}

/// Logs an info-level message, prefixed with the current scan pass.
#[macro_export]
macro_rules! engine_info {
    ($($arg:tt)*) => {{
        log::info!("{}{}", $crate::pass_prefix(), format_args!($($arg)*));
    }};
}

/// Logs a debug-level message, prefixed with the current scan pass.
#[macro_export]
macro_rules! engine_debug {
    ($($arg:tt)*) => {{
        log::debug!("{}{}", $crate::pass_prefix(), format_args!($($arg)*));
    }};
}

/// Logs a warn-level message, prefixed with the current scan pass.
#[macro_export]
macro_rules! engine_warn {
    ($($arg:tt)*) => {{
        log::warn!("{}{}", $crate::pass_prefix(), format_args!($($arg)*));
    }};
}

/// Logs an error-level message, prefixed with the current scan pass.
#[macro_export]
macro_rules! engine_error {
    ($($arg:tt)*) => {{
        log::error!("{}{}", $crate::pass_prefix(), format_args!($($arg)*));
    }};
}

/// Initializes a terminal logger for integration tests.
///
/// Safe to call from every test; only the first call installs a logger.
pub fn initialize_for_tests() {
    use simplelog::{ColorChoice, CombinedLogger, Config, TermLogger, TerminalMode};

    let level = if cfg!(debug_assertions) {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };

    let _ = CombinedLogger::init(vec![TermLogger::new(
        level,
        Config::default(),
        TerminalMode::Mixed,
        ColorChoice::Auto,
    )]);
}
