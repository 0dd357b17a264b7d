//! Extension target definitions
//!
//! An extension target is the fully resolved description of one compiled
//! module: every source, include directory and link library the toolchain
//! needs, with paths already resolved against the project root.

use serde::Serialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Resolved build description of a compiled extension module
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExtensionTarget {
    /// Manifest name of the target (e.g. `connect`)
    pub name: String,

    /// Dotted import path (e.g. `lib.wrapper.connect`)
    pub module: String,

    /// Binding sources first, then the shared native sources
    pub sources: Vec<PathBuf>,

    /// System libraries to link
    pub libraries: Vec<String>,

    /// Header search path, shared directories first
    pub include_dirs: Vec<PathBuf>,
}

impl ExtensionTarget {
    /// Path of the compiled module relative to the build lib directory
    ///
    /// `lib.wrapper.connect` with suffix `so` becomes `lib/wrapper/connect.so`.
    #[must_use]
    pub fn artifact_relative_path(&self, suffix: &str) -> PathBuf {
        let mut path: PathBuf = self.module.split('.').collect();
        path.set_extension(suffix);
        path
    }

    /// Whether the given file is part of this target's sources
    #[must_use]
    pub fn contains_source(&self, file_name: &str) -> bool {
        self.sources
            .iter()
            .any(|s| s.file_name().is_some_and(|n| n == file_name))
    }

    /// Sources that must go through the binding generator first
    pub fn binding_sources(&self) -> impl Iterator<Item = &Path> {
        self.sources
            .iter()
            .map(PathBuf::as_path)
            .filter(|s| is_binding_source(s))
    }
}

/// Cython sources are translated to C before compilation
#[must_use]
pub fn is_binding_source(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == "pyx")
}

/// Result of building one extension target
#[derive(Debug, Clone, Serialize)]
pub struct BuildResult {
    /// Target name
    pub target: String,

    /// Whether the build succeeded
    pub success: bool,

    /// Build duration
    pub duration: Duration,

    /// Compiled module, when the build succeeded
    pub artifact: Option<PathBuf>,

    /// Error message if failed
    pub error: Option<String>,

    /// Toolchain output (stdout + stderr)
    pub output: String,
}

impl BuildResult {
    /// Create a successful build result
    #[must_use]
    pub const fn success(
        target: String,
        duration: Duration,
        artifact: PathBuf,
        output: String,
    ) -> Self {
        Self {
            target,
            success: true,
            duration,
            artifact: Some(artifact),
            error: None,
            output,
        }
    }

    /// Create a failed build result
    #[must_use]
    pub const fn failure(target: String, duration: Duration, error: String, output: String) -> Self {
        Self {
            target,
            success: false,
            duration,
            artifact: None,
            error: Some(error),
            output,
        }
    }
}
