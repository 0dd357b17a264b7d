//! Build environment variable handling.
//!
//! Toolchain overrides follow the usual compiler conventions (`CC`,
//! `CFLAGS`, `LDFLAGS`). Orchestrator settings use the `PCAPI_` prefix.

use std::env;

// Helper for boolean environment variables that accept "1", "true", "yes"
fn is_enabled(var: &str) -> bool {
    env::var(var).ok().is_some_and(|s| {
        let s = s.to_lowercase();
        s == "1" || s == "true" || s == "yes"
    })
}

// Non-empty values only; an exported-but-empty variable counts as unset.
fn non_empty(var: &str) -> Option<String> {
    env::var(var).ok().filter(|s| !s.trim().is_empty())
}

// Whitespace-separated flag lists
fn flag_list(var: &str) -> Vec<String> {
    non_empty(var)
        .map(|s| s.split_whitespace().map(str::to_string).collect())
        .unwrap_or_default()
}

// Toolchain

/// Get C compiler override (`CC`).
pub fn cc() -> Option<String> {
    non_empty("CC")
}

/// Get extra compiler flags (`CFLAGS`, whitespace-separated).
pub fn cflags() -> Vec<String> {
    flag_list("CFLAGS")
}

/// Get extra linker flags (`LDFLAGS`, whitespace-separated).
pub fn ldflags() -> Vec<String> {
    flag_list("LDFLAGS")
}

/// Get binding generator override (`CYTHON`).
pub fn cython() -> Option<String> {
    non_empty("CYTHON")
}

/// Get Python interpreter override (`PYTHON`), used for header discovery.
pub fn python() -> Option<String> {
    non_empty("PYTHON")
}

/// Get Python include directory override (`PYTHON_INCLUDE`).
pub fn python_include() -> Option<String> {
    non_empty("PYTHON_INCLUDE")
}

// Orchestrator settings

/// Get manifest path override (`PCAPI_MANIFEST`).
pub fn manifest_path() -> Option<String> {
    non_empty("PCAPI_MANIFEST")
}

/// Get target platform override (`PCAPI_TARGET_PLATFORM`).
pub fn target_platform() -> Option<String> {
    non_empty("PCAPI_TARGET_PLATFORM")
}

/// Check whether debug output is requested (`PCAPI_DEBUG`).
pub fn debug_enabled() -> bool {
    is_enabled("PCAPI_DEBUG")
}
