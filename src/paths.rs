//! Manifest discovery and project-relative paths.

use crate::env_vars;
use crate::manifest::{MANIFEST_FILE, Manifest};
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

/// A manifest together with the project root its paths are relative to
#[derive(Debug, Clone)]
pub struct Project {
    pub manifest: Manifest,
    /// Directory containing the manifest (or the working directory)
    pub root: PathBuf,
    /// Manifest file on disk; `None` when the built-in default is in use
    pub manifest_path: Option<PathBuf>,
}

impl Project {
    /// Resolve a manifest-relative path against the project root
    #[must_use]
    pub fn resolve(&self, relative: &str) -> PathBuf {
        resolve_in(&self.root, relative)
    }

    /// Build output directory
    #[must_use]
    pub fn build_dir(&self) -> PathBuf {
        self.resolve(&self.manifest.project.build_dir)
    }

    /// Directory compiled modules and packages are placed under
    #[must_use]
    pub fn build_lib_dir(&self) -> PathBuf {
        self.build_dir().join("lib")
    }

    /// Directory for intermediate objects of one target
    #[must_use]
    pub fn build_temp_dir(&self, target: &str) -> PathBuf {
        self.build_dir().join("temp").join(target)
    }
}

/// Join `relative` onto `root` unless it is already absolute
#[must_use]
pub fn resolve_in(root: &Path, relative: &str) -> PathBuf {
    let path = Path::new(relative);
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        root.join(path)
    }
}

/// Find `pcapi.toml` in `dir` or any of its parents.
#[must_use]
pub fn find_manifest_in(dir: impl AsRef<Path>) -> Option<PathBuf> {
    dir.as_ref()
        .ancestors()
        .map(|ancestor| ancestor.join(MANIFEST_FILE))
        .find(|candidate| candidate.is_file())
}

/// Load the project manifest.
///
/// Priority: `custom_path` -> `PCAPI_MANIFEST` -> `pcapi.toml` in the
/// current directory or a parent -> built-in default rooted at the current
/// directory.
pub fn load_project(custom_path: Option<&str>) -> Result<Project> {
    let cwd = std::env::current_dir().context("Failed to determine current directory")?;
    load_project_from(&cwd, custom_path)
}

/// Same as [`load_project`], searching from `start` instead of the current
/// directory.
pub fn load_project_from(start: &Path, custom_path: Option<&str>) -> Result<Project> {
    let explicit = custom_path
        .map(str::to_string)
        .or_else(env_vars::manifest_path)
        .map(|p| resolve_in(start, &p));

    let manifest_path = match explicit {
        Some(path) => {
            if !path.is_file() {
                anyhow::bail!("Manifest not found: {}", path.display());
            }
            Some(path)
        }
        None => find_manifest_in(start),
    };

    let Some(path) = manifest_path else {
        crate::debug!("No {MANIFEST_FILE} found, using built-in manifest");
        return Ok(Project {
            manifest: Manifest::default(),
            root: start.to_path_buf(),
            manifest_path: None,
        });
    };

    crate::debug!("Using manifest {}", path.display());
    let manifest = Manifest::load_from(&path)?;
    let root = path
        .parent()
        .map_or_else(|| start.to_path_buf(), Path::to_path_buf);

    Ok(Project {
        manifest,
        root,
        manifest_path: Some(path),
    })
}
