//! Shared test helpers and utilities

use pcapi_build::{MANIFEST_FILE, MANIFEST_TEMPLATE};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tempfile::TempDir;

/// Path to the compiled pcapi-build binary
#[allow(dead_code)]
pub(crate) fn get_pcapi_build_binary() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_pcapi-build"))
}

/// Run pcapi-build in `dir` with `args`
#[allow(dead_code)]
pub(crate) fn run_in(dir: &Path, args: &[&str]) -> Output {
    Command::new(get_pcapi_build_binary())
        .current_dir(dir)
        .args(args)
        .env_remove("PCAPI_MANIFEST")
        .env_remove("PCAPI_TARGET_PLATFORM")
        .output()
        .expect("Failed to execute pcapi-build")
}

/// Write an empty file, creating parent directories
#[allow(dead_code)]
pub(crate) fn touch(root: &Path, relative: &str) {
    let path = root.join(relative);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("Failed to create fixture directory");
    }
    fs::write(path, "").expect("Failed to write fixture file");
}

/// Create a project laid out like the pcapi repository
///
/// Native sources go into `lib/dxfeed-c-api/src`; the wrapper gets a
/// `connect.pyx` binding and `lib/__init__.py`.
#[allow(dead_code)]
pub(crate) fn create_test_project(native_sources: &[&str]) -> TempDir {
    let temp = TempDir::new().expect("Failed to create temp dir");
    fs::write(temp.path().join(MANIFEST_FILE), MANIFEST_TEMPLATE)
        .expect("Failed to write manifest");

    fs::create_dir_all(temp.path().join("lib/dxfeed-c-api/src"))
        .expect("Failed to create source dir");
    for source in native_sources {
        touch(temp.path(), &format!("lib/dxfeed-c-api/src/{source}"));
    }
    touch(temp.path(), "lib/dxfeed-c-api/include/DXFeed.h");
    touch(temp.path(), "lib/wrapper/connect.pyx");
    touch(temp.path(), "lib/__init__.py");

    temp
}

/// Replace the project manifest
#[allow(dead_code)]
pub(crate) fn write_manifest(project: &TempDir, content: &str) {
    fs::write(project.path().join(MANIFEST_FILE), content).expect("Failed to write manifest");
}
