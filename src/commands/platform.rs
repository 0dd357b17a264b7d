//! Platform command
//!
//! Display platform detection and the platform's build profile

use anyhow::Result;
use pcapi_build::{ExclusionRule, detect_host_platform, load_project, resolve_platform};

pub(crate) fn run(manifest: Option<&str>, platform: Option<&str>) -> Result<()> {
    let project = load_project(manifest)?;
    let host = detect_host_platform();
    let target = resolve_platform(platform)?;
    let profile = project.manifest.platform_profile(target);

    println!("Platform Information:");
    println!();
    println!("  Host:           {host}");
    println!("  Target:         {target}");
    println!("  Module suffix:  .{}", target.module_suffix());

    println!();
    println!("Build Profile:");
    if profile.libraries.is_empty() {
        println!("  Libraries:      (none)");
    } else {
        println!("  Libraries:      {}", profile.libraries.join(", "));
    }
    if profile.exclude.is_empty() {
        println!("  Excluded:       (none)");
    } else {
        for rule in &profile.exclude {
            match rule {
                ExclusionRule::File { file } => println!("  Excluded file:  {file}"),
                ExclusionRule::Pattern { pattern } => println!("  Excluded regex: {pattern}"),
            }
        }
    }

    println!();
    println!("System Information:");
    println!("  OS:             {}", std::env::consts::OS);
    println!("  Architecture:   {}", std::env::consts::ARCH);
    println!("  Family:         {}", std::env::consts::FAMILY);

    Ok(())
}
