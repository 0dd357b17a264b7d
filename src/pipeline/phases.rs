//! Pre-build phases
//!
//! `clear` and `build-extensions` run in-process by default. Either can be
//! swapped for a legacy phase script through the manifest, in which case
//! only the script's exit code matters.

use super::{BuildContext, Phase, PhaseResult};
use crate::extensions::process::run_captured;
use crate::extensions::types::is_binding_source;
use crate::extensions::{BindingGenerator, ExtensionBuilder};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::Instant;

/// Compiled-module suffixes left behind by in-place builds
const MODULE_SUFFIXES: [&str; 4] = ["so", "pyd", "dll", "dylib"];

/// Removes in-place artifacts of earlier builds next to the bindings
#[derive(Debug, Clone, Copy, Default)]
pub struct ClearPhase;

impl ClearPhase {
    /// Files next to `binding` generated from it: the translated `connect.c`
    /// and `connect*.so`/`.pyd` style modules.
    ///
    /// Only `.pyx` bindings produce artifacts. A binding directory that does
    /// not exist has nothing to clear.
    fn stale_artifacts(binding: &Path) -> io::Result<Vec<PathBuf>> {
        if !is_binding_source(binding) {
            return Ok(Vec::new());
        }

        let (Some(dir), Some(stem)) = (
            binding.parent(),
            binding.file_stem().and_then(|s| s.to_str()),
        ) else {
            return Ok(Vec::new());
        };

        let entries = match fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e),
        };

        let generated = BindingGenerator::generated_path(binding, dir);
        let module_prefix = format!("{stem}.");

        let mut stale = Vec::new();
        for entry in entries {
            let path = entry?.path();
            if path == binding || !path.is_file() {
                continue;
            }

            let is_module = path
                .file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|name| name.starts_with(&module_prefix))
                && path
                    .extension()
                    .and_then(|e| e.to_str())
                    .is_some_and(|e| MODULE_SUFFIXES.contains(&e));

            if path == generated || is_module {
                stale.push(path);
            }
        }

        Ok(stale)
    }
}

impl Phase for ClearPhase {
    fn name(&self) -> &str {
        "clear"
    }

    fn run(&self, ctx: &BuildContext) -> PhaseResult {
        let start_time = Instant::now();
        let mut output = String::new();
        let mut removed = 0_usize;

        // Every declared target, enabled or not, may have left artifacts
        let bindings = ctx
            .project
            .manifest
            .targets
            .iter()
            .flat_map(|t| &t.bindings)
            .map(|b| ctx.project.resolve(b));

        for binding in bindings {
            let stale_files = match Self::stale_artifacts(&binding) {
                Ok(files) => files,
                Err(e) => {
                    return PhaseResult::failure(
                        self.name().to_string(),
                        start_time.elapsed(),
                        format!("Failed to scan {}: {e}", binding.display()),
                        output,
                    );
                }
            };

            for stale in stale_files {
                if let Err(e) = fs::remove_file(&stale) {
                    return PhaseResult::failure(
                        self.name().to_string(),
                        start_time.elapsed(),
                        format!("Failed to remove {}: {e}", stale.display()),
                        output,
                    );
                }
                removed += 1;
                if ctx.verbose {
                    output.push_str(&format!("  Removed {}\n", stale.display()));
                }
            }
        }

        crate::debug!("clear removed {removed} stale artifacts");
        PhaseResult::success(self.name().to_string(), start_time.elapsed(), output)
    }
}

/// Builds every assembled extension target
#[derive(Debug, Clone, Copy, Default)]
pub struct BuildExtensionsPhase;

impl Phase for BuildExtensionsPhase {
    fn name(&self) -> &str {
        "build-extensions"
    }

    fn run(&self, ctx: &BuildContext) -> PhaseResult {
        let start_time = Instant::now();

        let mut builder = ExtensionBuilder::new(ctx.platform, ctx.toolchain.clone(), ctx.verbose);
        let temp_root = ctx.project.build_dir().join("temp");
        let results = builder.build_many(&ctx.targets, &temp_root, &ctx.project.build_lib_dir());

        let output: String = results.iter().map(|r| r.output.as_str()).collect();
        let failures: Vec<String> = results
            .iter()
            .filter(|r| !r.success)
            .map(|r| {
                format!(
                    "{}: {}",
                    r.target,
                    r.error.as_deref().unwrap_or("unknown error")
                )
            })
            .collect();

        let result = if failures.is_empty() {
            PhaseResult::success(self.name().to_string(), start_time.elapsed(), output)
        } else {
            PhaseResult::failure(
                self.name().to_string(),
                start_time.elapsed(),
                failures.join("; "),
                output,
            )
        };

        result.with_builds(results)
    }
}

/// Legacy phase script run as a child process in the project root
#[derive(Debug, Clone)]
pub struct CommandPhase {
    name: String,
    argv: Vec<String>,
}

impl CommandPhase {
    #[must_use]
    pub fn new(name: &str, argv: Vec<String>) -> Self {
        Self {
            name: name.to_string(),
            argv,
        }
    }
}

impl Phase for CommandPhase {
    fn name(&self) -> &str {
        &self.name
    }

    fn run(&self, ctx: &BuildContext) -> PhaseResult {
        let start_time = Instant::now();
        let mut output = String::new();

        let Some((program, args)) = self.argv.split_first() else {
            return PhaseResult::failure(
                self.name.clone(),
                start_time.elapsed(),
                "Phase command is empty".to_string(),
                output,
            );
        };

        let mut cmd = Command::new(program);
        cmd.args(args).current_dir(&ctx.project.root);

        match run_captured(&mut cmd, &self.name, ctx.verbose, &mut output) {
            Ok(()) => PhaseResult::success(self.name.clone(), start_time.elapsed(), output),
            Err(e) => PhaseResult::failure(self.name.clone(), start_time.elapsed(), e, output),
        }
    }
}
