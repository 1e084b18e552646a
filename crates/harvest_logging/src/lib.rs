#![deny(missing_docs)]
//! Shared logging utilities for the harvester workspace.
//!
//! This crate provides the `harvest_*` logging macros used across the codebase
//! and a minimal test initializer for the global logger. Every message is
//! prefixed with the listing cursor (page and row) of the current thread so a
//! log line can be traced back to the row that produced it.

use std::cell::Cell;

#[doc(hidden)]
pub use log;

thread_local! {
    /// Thread-local storage for the listing position being processed.
    static CURSOR: Cell<(Option<usize>, Option<usize>)> = const { Cell::new((None, None)) };
}

/// Marks the listing page currently being processed and clears the row.
pub fn set_page(page: usize) {
    CURSOR.with(|c| c.set((Some(page), None)));
}

/// Marks the row currently being processed on the current page.
pub fn set_row(row: usize) {
    CURSOR.with(|c| {
        let (page, _) = c.get();
        c.set((page, Some(row)));
    });
}

/// Clears the row marker once a row has been fully processed.
pub fn clear_row() {
    CURSOR.with(|c| {
        let (page, _) = c.get();
        c.set((page, None));
    });
}

/// Clears the whole cursor, typically when a run ends.
pub fn reset_cursor() {
    CURSOR.with(|c| c.set((None, None)));
}

/// Returns the `(page, row)` cursor for the current thread.
pub fn cursor() -> (Option<usize>, Option<usize>) {
    CURSOR.with(|c| c.get())
}

/// Renders the cursor as a log prefix such as `[p3 r7] `; empty when unset.
pub fn cursor_prefix() -> String {
    match cursor() {
        (Some(page), Some(row)) => format!("[p{page} r{row}] "),
        (Some(page), None) => format!("[p{page}] "),
        (None, Some(row)) => format!("[r{row}] "),
        (None, None) => String::new(),
    }
}

/// Logs a trace-level message using the global logging facade.
#[macro_export]
macro_rules! harvest_trace {
    ($($arg:tt)*) => {{
        $crate::log::trace!("{}{}", $crate::cursor_prefix(), format_args!($($arg)*));
    }};
}

/// Logs an info-level message using the global logging facade.
#[macro_export]
macro_rules! harvest_info {
    ($($arg:tt)*) => {{
        $crate::log::info!("{}{}", $crate::cursor_prefix(), format_args!($($arg)*));
    }};
}

/// Logs a debug-level message using the global logging facade.
#[macro_export]
macro_rules! harvest_debug {
    ($($arg:tt)*) => {{
        $crate::log::debug!("{}{}", $crate::cursor_prefix(), format_args!($($arg)*));
    }};
}

/// Logs a warn-level message using the global logging facade.
#[macro_export]
macro_rules! harvest_warn {
    ($($arg:tt)*) => {{
        $crate::log::warn!("{}{}", $crate::cursor_prefix(), format_args!($($arg)*));
    }};
}

/// Logs an error-level message using the global logging facade.
#[macro_export]
macro_rules! harvest_error {
    ($($arg:tt)*) => {{
        $crate::log::error!("{}{}", $crate::cursor_prefix(), format_args!($($arg)*));
    }};
}

/// Initializes a simple terminal logger for use in unit tests.
///
/// This safely no-ops if another logger has already been initialized.
pub fn initialize_for_tests() {
    use simplelog::{ColorChoice, CombinedLogger, Config, TermLogger, TerminalMode};

    // Use debug level in debug builds, info in release builds.
    let level = if cfg!(debug_assertions) {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };

    // Ignore the error if a logger was already set by another test.
    let _ = CombinedLogger::init(vec![TermLogger::new(
        level,
        Config::default(),
        TerminalMode::Mixed,
        ColorChoice::Auto,
    )]);
}
