//! Error types
//!
//! Configuration errors are fixed by editing the manifest or the source
//! tree. Pipeline errors abort a build. Neither is retried.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Source directory not found: {}", path.display())]
    SourceDirMissing { path: PathBuf },

    #[error("Failed to read source directory {}: {source}", path.display())]
    SourceDirUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Exclusion {name} for {platform} must be a plain file name")]
    InvalidExclusion { name: String, platform: String },

    #[error("Excluded source {name} does not exist in {} (fix the [platforms.{platform}] exclusions)", dir.display())]
    ExclusionMissing {
        name: String,
        dir: PathBuf,
        platform: String,
    },

    #[error("Invalid exclusion pattern {pattern}: {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: Box<regex::Error>,
    },

    #[error("No extension target is enabled (enable one with `pcapi-build enable <name>`)")]
    NoActiveTargets,

    #[error("Unknown extension target: {0}")]
    UnknownTarget(String),

    #[error("Unknown platform: {0} (expected windows, linux or macos)")]
    UnknownPlatform(String),

    #[error("Failed to parse manifest {}: {source}", path.display())]
    ManifestParse {
        path: PathBuf,
        #[source]
        source: Box<toml::de::Error>,
    },
}

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Failed to remove build directory {}: {source}", path.display())]
    Cleanup {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Phase {phase} failed: {diagnostic}")]
    PhaseFailed { phase: String, diagnostic: String },
}
