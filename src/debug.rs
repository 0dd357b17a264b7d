//! Debug logging utilities
//!
//! Debug output is enabled by the global `--debug` flag or `PCAPI_DEBUG`.
//! When disabled, the `debug!` macro only costs a flag check.

use std::sync::OnceLock;

static DEBUG_ENABLED: OnceLock<bool> = OnceLock::new();

/// Initialize debug mode from the command-line flag and environment.
///
/// Only the first call takes effect.
pub fn init_debug(enabled: bool) {
    let enabled = enabled || crate::env_vars::debug_enabled();
    let _ = DEBUG_ENABLED.set(enabled);
}

/// Check if debug mode is enabled
pub fn is_debug_enabled() -> bool {
    DEBUG_ENABLED.get().copied().unwrap_or(false)
}

/// Print formatted debug message if debug mode is enabled
pub fn debug_logf(args: std::fmt::Arguments<'_>) {
    if is_debug_enabled() {
        eprintln!("[DEBUG] {args}");
    }
}

/// Macro for convenient debug logging
///
/// Usage: `debug!("collected {} sources", count)`
#[macro_export]
macro_rules! debug {
    ($($arg:tt)*) => {
        $crate::debug::debug_logf(format_args!($($arg)*))
    };
}
