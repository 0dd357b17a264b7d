//! Binding generation
//!
//! Wrapper sources are Cython (`.pyx`) modules. They are translated to C
//! before the compiler sees them:
//! ```bash
//! cython -3 -I lib/wrapper/pxd_include lib/wrapper/connect.pyx -o build/temp/connect/gen/connect.c
//! ```

use super::process::{find_in_path, run_captured};
use crate::manifest::Toolchain;
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::process::Command;

/// Cython binding generator
#[derive(Debug)]
pub struct BindingGenerator {
    /// Path to the `cython` executable
    cython_path: PathBuf,
    /// Arguments passed before the input file (e.g. `-3`)
    args: Vec<String>,
    /// Echo commands into the build log
    verbose: bool,
}

impl BindingGenerator {
    /// Create a new binding generator
    ///
    /// Priority order for the executable:
    /// 1. `CYTHON` environment variable
    /// 2. `cython` from the toolchain configuration
    /// 3. `cython` in `PATH`
    pub fn new(toolchain: &Toolchain, verbose: bool) -> Result<Self> {
        let cython_path = Self::find_cython_executable(toolchain)
            .context("Cython not found. Wrapper bindings require Cython to be installed.")?;

        Ok(Self {
            cython_path,
            args: toolchain.cython_args.clone(),
            verbose,
        })
    }

    fn find_cython_executable(toolchain: &Toolchain) -> Result<PathBuf> {
        if let Some(path) = crate::env_vars::cython()
            .or_else(|| toolchain.cython.clone())
            .map(PathBuf::from)
        {
            if path.exists() {
                return Ok(path);
            }
            // A bare name such as "cython3" is looked up on PATH
            if let Some(found) = path.to_str().and_then(find_in_path) {
                return Ok(found);
            }
        }

        find_in_path("cython")
            .or_else(|| find_in_path("cython3"))
            .ok_or_else(|| anyhow::anyhow!("Cython executable not found in PATH or CYTHON"))
    }

    /// Where the generated C file for `binding` is written
    #[must_use]
    pub fn generated_path(binding: &Path, out_dir: &Path) -> PathBuf {
        let stem = binding
            .file_stem()
            .map_or_else(|| "binding".into(), ToOwned::to_owned);
        let mut path = out_dir.join(stem);
        path.set_extension("c");
        path
    }

    /// Translate `binding` into C.
    ///
    /// `include_dirs` are passed as `-I` so `cimport` can find `.pxd` files.
    /// Output is appended to `log`.
    pub fn generate(
        &self,
        binding: &Path,
        include_dirs: &[PathBuf],
        out_dir: &Path,
        log: &mut String,
    ) -> Result<PathBuf, String> {
        std::fs::create_dir_all(out_dir)
            .map_err(|e| format!("Failed to create {}: {e}", out_dir.display()))?;

        let output = Self::generated_path(binding, out_dir);

        let mut cmd = Command::new(&self.cython_path);
        cmd.args(&self.args);
        for dir in include_dirs {
            cmd.arg("-I").arg(dir);
        }
        cmd.arg(binding).arg("-o").arg(&output);

        run_captured(&mut cmd, "cython", self.verbose, log)?;
        Ok(output)
    }
}
