//! Targets command
//!
//! List declared extension targets

use anyhow::Result;
use pcapi_build::load_project;

pub(crate) fn run(manifest: Option<&str>, json: bool) -> Result<()> {
    let project = load_project(manifest)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&project.manifest.targets)?);
        return Ok(());
    }

    println!("Targets in {}:", super::manifest_origin(&project));
    for target in &project.manifest.targets {
        let marker = if target.enabled { "*" } else { " " };
        let state = if target.enabled { "enabled" } else { "disabled" };
        println!("  {marker} {:<12} {:<28} {state}", target.name, target.module);
    }

    Ok(())
}
