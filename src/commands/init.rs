//! Init command
//!
//! Create a default pcapi.toml

use anyhow::{Context, Result};
use pcapi_build::{MANIFEST_FILE, MANIFEST_TEMPLATE};
use std::fs;
use std::path::Path;

/// Write the default manifest into `path`
pub(crate) fn run(path: &str) -> Result<()> {
    let manifest_path = Path::new(path).join(MANIFEST_FILE);

    if manifest_path.exists() {
        anyhow::bail!("{MANIFEST_FILE} already exists at {}", manifest_path.display());
    }

    fs::create_dir_all(path).with_context(|| format!("Failed to create directory {path}"))?;
    fs::write(&manifest_path, MANIFEST_TEMPLATE)
        .with_context(|| format!("Failed to write {}", manifest_path.display()))?;

    println!("Created {}", manifest_path.display());
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, reason = "Tests can panic")]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn writes_template() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join("project");

        run(dir.to_str().unwrap()).unwrap();

        let written = fs::read_to_string(dir.join(MANIFEST_FILE)).unwrap();
        assert_eq!(written, MANIFEST_TEMPLATE);
    }

    #[test]
    fn refuses_to_overwrite() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join(MANIFEST_FILE), "keep me").unwrap();

        let err = run(temp.path().to_str().unwrap()).unwrap_err();
        assert!(err.to_string().contains("already exists"));

        let kept = fs::read_to_string(temp.path().join(MANIFEST_FILE)).unwrap();
        assert_eq!(kept, "keep me");
    }
}
