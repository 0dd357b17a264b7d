//! Standard build step
//!
//! Copies the declared Python packages into `<build>/lib`, next to the
//! compiled modules. Only files with a package suffix (`.py`, `.pxd` by
//! default) are copied, so vendored C sources stay out of the build tree.

use super::{BuildContext, Phase, PhaseResult};
use std::fs;
use std::path::Path;
use std::time::Instant;
use walkdir::WalkDir;

#[derive(Debug, Clone, Copy, Default)]
pub struct PackageStep;

impl PackageStep {
    /// Copy one package directory. Returns the number of files copied.
    fn copy_package(
        package_dir: &Path,
        root: &Path,
        build_dir: &Path,
        lib_dir: &Path,
        suffixes: &[String],
        verbose: bool,
        output: &mut String,
    ) -> Result<usize, String> {
        if !package_dir.is_dir() {
            return Err(format!("Package directory not found: {}", package_dir.display()));
        }

        let mut copied = 0;
        let walker = WalkDir::new(package_dir)
            .sort_by_file_name()
            .into_iter()
            // The build directory may live inside a package
            .filter_entry(|entry| entry.path() != build_dir);

        for entry in walker {
            let entry = entry.map_err(|e| format!("Failed to walk {}: {e}", package_dir.display()))?;
            let path = entry.path();

            if !entry.file_type().is_file() {
                continue;
            }
            let wanted = path
                .extension()
                .and_then(|e| e.to_str())
                .is_some_and(|e| suffixes.iter().any(|s| s == e));
            if !wanted {
                continue;
            }

            let relative = path
                .strip_prefix(root)
                .map_err(|_| format!("{} is outside the project root", path.display()))?;
            let target = lib_dir.join(relative);

            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent)
                    .map_err(|e| format!("Failed to create {}: {e}", parent.display()))?;
            }
            fs::copy(path, &target).map_err(|e| {
                format!(
                    "Failed to copy {} to {}: {e}",
                    path.display(),
                    target.display()
                )
            })?;

            copied += 1;
            if verbose {
                output.push_str(&format!("  Copied {}\n", relative.display()));
            }
        }

        Ok(copied)
    }
}

impl Phase for PackageStep {
    fn name(&self) -> &str {
        "package"
    }

    fn run(&self, ctx: &BuildContext) -> PhaseResult {
        let start_time = Instant::now();
        let mut output = String::new();
        let project = &ctx.project;
        let build_dir = project.build_dir();
        let lib_dir = project.build_lib_dir();

        for package in &project.manifest.project.packages {
            let package_dir = project.resolve(package);
            match Self::copy_package(
                &package_dir,
                &project.root,
                &build_dir,
                &lib_dir,
                &project.manifest.project.package_suffixes,
                ctx.verbose,
                &mut output,
            ) {
                Ok(count) => crate::debug!("Copied {count} files from package {package}"),
                Err(e) => {
                    return PhaseResult::failure(
                        self.name().to_string(),
                        start_time.elapsed(),
                        e,
                        output,
                    );
                }
            }
        }

        PhaseResult::success(self.name().to_string(), start_time.elapsed(), output)
    }
}
