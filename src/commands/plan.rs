//! Plan command
//!
//! Show what `build` would compile, without touching the build directory

use anyhow::Result;
use pcapi_build::{assemble, load_project, resolve_platform};

pub(crate) fn run(manifest: Option<&str>, platform: Option<&str>, json: bool) -> Result<()> {
    let project = load_project(manifest)?;
    let platform = resolve_platform(platform)?;
    let targets = assemble(&project, platform)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&targets)?);
        return Ok(());
    }

    println!("Platform: {platform}");
    println!("Manifest: {}", super::manifest_origin(&project));

    for target in &targets {
        let artifact = project
            .build_lib_dir()
            .join(target.artifact_relative_path(platform.module_suffix()));

        println!();
        println!("{} ({})", target.name, target.module);
        println!("  Output:    {}", artifact.display());
        println!("  Libraries: {}", target.libraries.join(", "));
        println!("  Includes:");
        for dir in &target.include_dirs {
            println!("    {}", dir.display());
        }
        println!("  Sources ({}):", target.sources.len());
        for source in &target.sources {
            let shown = source.strip_prefix(&project.root).unwrap_or(source);
            println!("    {}", shown.display());
        }
    }

    let disabled: Vec<_> = project
        .manifest
        .targets
        .iter()
        .filter(|t| !t.enabled)
        .map(|t| t.name.as_str())
        .collect();
    if !disabled.is_empty() {
        println!();
        println!("Disabled: {}", disabled.join(", "));
    }

    Ok(())
}
