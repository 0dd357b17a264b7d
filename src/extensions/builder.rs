//! Extension Builder Orchestration
//!
//! Builds assembled extension targets: binding generation, parallel object
//! compilation, then linking into `<build>/lib/<module path>.<suffix>`.

use super::binding::BindingGenerator;
use super::compiler::CCompiler;
use super::types::{BuildResult, ExtensionTarget, is_binding_source};
use crate::manifest::Toolchain;
use crate::platform::TargetPlatform;
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

/// Extension builder coordinator
#[derive(Debug)]
pub struct ExtensionBuilder {
    /// Platform the modules are built for
    platform: TargetPlatform,
    /// Toolchain configuration
    toolchain: Toolchain,
    /// Enable verbose output
    verbose: bool,
    /// C compiler driver
    compiler: CCompiler,
    /// Binding generator (lazy-initialized; not every target has bindings)
    generator: Option<BindingGenerator>,
}

impl ExtensionBuilder {
    /// Create a new extension builder.
    #[must_use]
    pub fn new(platform: TargetPlatform, toolchain: Toolchain, verbose: bool) -> Self {
        let compiler = CCompiler::new(&toolchain, platform, verbose);
        Self {
            platform,
            toolchain,
            verbose,
            compiler,
            generator: None,
        }
    }

    /// Compiler driver in use
    #[must_use]
    pub const fn compiler(&self) -> &CCompiler {
        &self.compiler
    }

    /// Build one target.
    ///
    /// Intermediate files go under `temp_dir`; the module is written below
    /// `lib_dir`. Failures are reported in the result, never panicked on.
    pub fn build(&mut self, target: &ExtensionTarget, temp_dir: &Path, lib_dir: &Path) -> BuildResult {
        let start_time = Instant::now();
        let mut output = String::new();

        if self.verbose {
            output.push_str(&format!(
                "Building {} ({} sources) for {}\n",
                target.module,
                target.sources.len(),
                self.platform
            ));
        }

        // Step 1: translate bindings to C
        let compile_units = match self.generate_bindings(target, temp_dir, &mut output) {
            Ok(units) => units,
            Err(e) => {
                return BuildResult::failure(target.name.clone(), start_time.elapsed(), e, output);
            }
        };

        // Step 2: compile objects in parallel
        let obj_dir = temp_dir.join("obj");
        let compiled: Vec<(PathBuf, Result<(), String>, String)> = compile_units
            .par_iter()
            .enumerate()
            .map(|(index, source)| {
                let object = CCompiler::object_path(source, index, &obj_dir);
                let mut log = String::new();
                let result = self.compiler.compile(source, &object, target, &mut log);
                (object, result, log)
            })
            .collect();

        let mut objects = Vec::with_capacity(compiled.len());
        let mut first_error = None;
        for (object, result, log) in compiled {
            output.push_str(&log);
            match result {
                Ok(()) => objects.push(object),
                Err(e) => {
                    first_error.get_or_insert(e);
                }
            }
        }

        if let Some(error) = first_error {
            return BuildResult::failure(target.name.clone(), start_time.elapsed(), error, output);
        }

        // Step 3: link
        let artifact = lib_dir.join(target.artifact_relative_path(self.platform.module_suffix()));
        if let Err(e) = self.compiler.link(&objects, &artifact, target, &mut output) {
            return BuildResult::failure(target.name.clone(), start_time.elapsed(), e, output);
        }

        crate::debug!("Built {} -> {}", target.name, artifact.display());
        BuildResult::success(target.name.clone(), start_time.elapsed(), artifact, output)
    }

    /// Replace binding sources with generated C files, keeping source order
    fn generate_bindings(
        &mut self,
        target: &ExtensionTarget,
        temp_dir: &Path,
        output: &mut String,
    ) -> Result<Vec<PathBuf>, String> {
        if target.binding_sources().next().is_none() {
            return Ok(target.sources.clone());
        }

        // Lazy-initialize the generator
        if self.generator.is_none() {
            let generator = BindingGenerator::new(&self.toolchain, self.verbose)
                .map_err(|e| format!("Failed to initialize binding generator: {e:#}"))?;
            self.generator = Some(generator);
        }

        let Some(generator) = self.generator.as_ref() else {
            return Err("Binding generator not initialized".to_string());
        };

        let gen_dir = temp_dir.join("gen");
        target
            .sources
            .iter()
            .map(|source| {
                if is_binding_source(source) {
                    generator.generate(source, &target.include_dirs, &gen_dir, output)
                } else {
                    Ok(source.clone())
                }
            })
            .collect()
    }

    /// Build several targets in order
    ///
    /// Each target gets its own temp directory under `temp_root`.
    pub fn build_many(
        &mut self,
        targets: &[ExtensionTarget],
        temp_root: &Path,
        lib_dir: &Path,
    ) -> Vec<BuildResult> {
        targets
            .iter()
            .map(|target| self.build(target, &temp_root.join(&target.name), lib_dir))
            .collect()
    }

    /// Get summary statistics
    ///
    /// # Returns
    /// (`successful_count`, `failed_count`, `total_duration`)
    #[must_use]
    pub fn summarize(results: &[BuildResult]) -> (usize, usize, Duration) {
        let successful = results.iter().filter(|r| r.success).count();
        let failed = results.len() - successful;
        let total_duration = results.iter().map(|r| r.duration).sum();

        (successful, failed, total_duration)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, reason = "Tests can panic")]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn target(sources: Vec<PathBuf>) -> ExtensionTarget {
        ExtensionTarget {
            name: "connect".to_string(),
            module: "lib.wrapper.connect".to_string(),
            sources,
            libraries: Vec::new(),
            include_dirs: Vec::new(),
        }
    }

    fn toolchain_with_cc(cc: &str) -> Toolchain {
        Toolchain {
            cc: Some(cc.to_string()),
            python_include: Some("/nonexistent/python".to_string()),
            ..Toolchain::default()
        }
    }

    #[test]
    fn missing_compiler_fails_target() {
        if crate::env_vars::cc().is_some() {
            // CC from the environment would override the broken compiler
            return;
        }
        let temp = TempDir::new().unwrap();
        let source = temp.path().join("A.c");
        fs::write(&source, "int a(void) { return 1; }\n").unwrap();

        let mut builder = ExtensionBuilder::new(
            TargetPlatform::Linux,
            toolchain_with_cc("pcapi-build-surely-missing-cc"),
            false,
        );
        let result = builder.build(
            &target(vec![source]),
            &temp.path().join("temp"),
            &temp.path().join("lib"),
        );

        assert!(!result.success);
        assert!(result.artifact.is_none());
        assert!(result.error.unwrap().contains("compile"));
    }

    #[test]
    fn missing_generator_fails_before_compiling() {
        if crate::env_vars::cython().is_some() {
            return;
        }
        let temp = TempDir::new().unwrap();
        let toolchain = Toolchain {
            cython: Some("pcapi-build-surely-missing-cython".to_string()),
            ..toolchain_with_cc("pcapi-build-surely-missing-cc")
        };
        let mut builder = ExtensionBuilder::new(TargetPlatform::Linux, toolchain, false);

        let result = builder.build(
            &target(vec![PathBuf::from("connect.pyx")]),
            &temp.path().join("temp"),
            &temp.path().join("lib"),
        );

        assert!(!result.success);
        let error = result.error.unwrap();
        assert!(
            error.contains("binding generator") || error.contains("cython"),
            "unexpected error: {error}"
        );
        assert!(!temp.path().join("temp").join("obj").exists());
    }

    #[test]
    fn summarize_mixed() {
        let results = vec![
            BuildResult::success(
                "connect".to_string(),
                Duration::from_secs(1),
                PathBuf::from("connect.so"),
                String::new(),
            ),
            BuildResult::failure(
                "subscribe".to_string(),
                Duration::from_secs(2),
                "error".to_string(),
                String::new(),
            ),
        ];

        let (successful, failed, duration) = ExtensionBuilder::summarize(&results);

        assert_eq!(successful, 1);
        assert_eq!(failed, 1);
        assert_eq!(duration, Duration::from_secs(3));
    }

    #[test]
    fn summarize_empty() {
        let (successful, failed, duration) = ExtensionBuilder::summarize(&[]);
        assert_eq!((successful, failed), (0, 0));
        assert_eq!(duration, Duration::ZERO);
    }
}
