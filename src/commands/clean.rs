//! Clean command
//!
//! Remove the build directory

use anyhow::Result;
use pcapi_build::{load_project, remove_build_dir};

pub(crate) fn run(manifest: Option<&str>) -> Result<()> {
    let project = load_project(manifest)?;
    let build_dir = project.build_dir();

    if remove_build_dir(&build_dir)? {
        println!("Removed {}", build_dir.display());
    } else {
        println!("Nothing to clean at {}", build_dir.display());
    }

    Ok(())
}
