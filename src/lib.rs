//! pcapi-build internal library code
//!
//! Assembles and builds the compiled extension modules of the pcapi binding
//! layer around the dxFeed C API, and runs the pre-build pipeline.

pub mod debug;
pub mod env_vars;
pub mod error;
pub mod extensions;
pub mod manifest;
pub mod paths;
pub mod pipeline;
pub mod platform;

// Re-export common types for convenience
pub use debug::{debug_logf, init_debug, is_debug_enabled};
pub use error::{ConfigError, PipelineError};
pub use extensions::{BuildResult, ExtensionBuilder, ExtensionTarget, assemble};
pub use manifest::{
    ExclusionRule, MANIFEST_FILE, MANIFEST_TEMPLATE, Manifest, PhaseSpec, PlatformProfile,
    TargetSpec, Toolchain,
};
pub use paths::{Project, find_manifest_in, load_project, load_project_from};
pub use pipeline::{
    BuildContext, Phase, PhaseResult, Pipeline, PipelineObserver, PipelineReport,
    remove_build_dir,
};
pub use platform::{TargetPlatform, detect_host_platform, resolve_platform};
