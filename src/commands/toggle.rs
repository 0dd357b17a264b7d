//! Enable/disable commands
//!
//! Flip a target's `enabled` flag in pcapi.toml. Shared source collection is
//! untouched; only the target list changes.

use anyhow::{Context, Result};
use pcapi_build::load_project;

pub(crate) fn run(manifest: Option<&str>, name: &str, enabled: bool) -> Result<()> {
    let mut project = load_project(manifest)?;

    let path = project.manifest_path.clone().context(
        "No pcapi.toml found. Run `pcapi-build init` to create one before toggling targets.",
    )?;

    let changed = project.manifest.set_enabled(name, enabled)?;
    let state = if enabled { "enabled" } else { "disabled" };

    if !changed {
        println!("Target {name} is already {state}");
        return Ok(());
    }

    project.manifest.save(&path)?;
    println!("Target {name} {state} in {}", path.display());
    Ok(())
}
