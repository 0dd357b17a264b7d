//! Build directory cleanup

use crate::error::PipelineError;
use std::fs;
use std::io::ErrorKind;
use std::path::Path;

/// Recursively remove the build directory.
///
/// A missing directory is not an error. Returns whether anything was
/// removed. Any other I/O failure (permissions, files in use) aborts.
pub fn remove_build_dir(path: &Path) -> Result<bool, PipelineError> {
    match fs::remove_dir_all(path) {
        Ok(()) => {
            crate::debug!("Removed build directory {}", path.display());
            Ok(true)
        }
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
        Err(source) => Err(PipelineError::Cleanup {
            path: path.to_path_buf(),
            source,
        }),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, reason = "Tests can panic")]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn missing_directory_is_not_an_error() {
        let temp = TempDir::new().unwrap();
        let build = temp.path().join("build");

        assert!(!remove_build_dir(&build).unwrap());
        assert!(!remove_build_dir(&build).unwrap());
    }

    #[test]
    fn removes_nested_content() {
        let temp = TempDir::new().unwrap();
        let build = temp.path().join("build");
        fs::create_dir_all(build.join("temp").join("connect")).unwrap();
        fs::write(build.join("temp").join("connect").join("A.o"), "obj").unwrap();

        assert!(remove_build_dir(&build).unwrap());
        assert!(!build.exists());
    }

    #[test]
    fn file_in_place_of_directory_aborts() {
        let temp = TempDir::new().unwrap();
        let build = temp.path().join("build");
        fs::write(&build, "not a directory").unwrap();

        let err = remove_build_dir(&build).unwrap_err();
        assert!(matches!(err, PipelineError::Cleanup { .. }));
    }
}
