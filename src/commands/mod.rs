//! Subcommand implementations

pub(crate) mod build;
pub(crate) mod clean;
pub(crate) mod completion;
pub(crate) mod init;
pub(crate) mod plan;
pub(crate) mod platform;
pub(crate) mod targets;
pub(crate) mod toggle;

use anyhow::Result;
use pcapi_build::{Project, Toolchain};

/// Manifest toolchain with user-level defaults filled in
pub(crate) fn effective_toolchain(project: &Project) -> Result<Toolchain> {
    let user = Toolchain::load_user_defaults()?;
    Ok(project.manifest.toolchain.clone().or(user))
}

/// Describe where the manifest came from
pub(crate) fn manifest_origin(project: &Project) -> String {
    project.manifest_path.as_ref().map_or_else(
        || format!("built-in manifest (root {})", project.root.display()),
        |p| p.display().to_string(),
    )
}
