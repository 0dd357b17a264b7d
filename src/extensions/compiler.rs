//! C compilation and linking
//!
//! Compiles each source of a target to an object file and links the objects
//! into an importable module, the same steps setuptools runs:
//! ```bash
//! cc -c -fPIC -I<include> <source> -o <object>
//! cc -shared <objects> -o lib/wrapper/connect.so -l<library>
//! ```

use super::process::run_captured;
use super::types::ExtensionTarget;
use crate::manifest::Toolchain;
use crate::platform::TargetPlatform;
use std::path::{Path, PathBuf};
use std::process::Command;

/// C compiler driver
#[derive(Debug, Clone)]
pub struct CCompiler {
    /// Compiler executable (also used as the linker driver)
    cc: String,
    /// Extra compile flags
    cflags: Vec<String>,
    /// Extra link flags
    ldflags: Vec<String>,
    /// Python headers, needed by generated binding code
    python_include: Option<PathBuf>,
    /// Target platform
    platform: TargetPlatform,
    /// Echo commands into the build log
    verbose: bool,
}

impl CCompiler {
    /// Create a compiler from the toolchain configuration.
    ///
    /// `CC`, `CFLAGS` and `LDFLAGS` override the toolchain values.
    #[must_use]
    pub fn new(toolchain: &Toolchain, platform: TargetPlatform, verbose: bool) -> Self {
        let cc = crate::env_vars::cc()
            .or_else(|| toolchain.cc.clone())
            .unwrap_or_else(|| "cc".to_string());

        let env_cflags = crate::env_vars::cflags();
        let cflags = if env_cflags.is_empty() {
            toolchain.cflags.clone()
        } else {
            env_cflags
        };

        let env_ldflags = crate::env_vars::ldflags();
        let ldflags = if env_ldflags.is_empty() {
            toolchain.ldflags.clone()
        } else {
            env_ldflags
        };

        Self {
            cc,
            cflags,
            ldflags,
            python_include: detect_python_include(toolchain),
            platform,
            verbose,
        }
    }

    /// Compiler executable in use
    #[must_use]
    pub fn cc(&self) -> &str {
        &self.cc
    }

    /// Object file path for the `index`-th source of a target.
    ///
    /// The index keeps objects apart when two sources share a stem.
    #[must_use]
    pub fn object_path(source: &Path, index: usize, obj_dir: &Path) -> PathBuf {
        let stem = source
            .file_stem()
            .map_or_else(|| "source".to_string(), |s| s.to_string_lossy().into_owned());
        obj_dir.join(format!("{index:03}-{stem}.o"))
    }

    /// Build the compile command for one source
    #[must_use]
    pub fn compile_command(&self, source: &Path, object: &Path, target: &ExtensionTarget) -> Command {
        let mut cmd = Command::new(&self.cc);
        cmd.arg("-c");
        if self.platform.needs_pic() {
            cmd.arg("-fPIC");
        }
        for dir in &target.include_dirs {
            cmd.arg(format!("-I{}", dir.display()));
        }
        if let Some(python) = &self.python_include {
            cmd.arg(format!("-I{}", python.display()));
        }
        cmd.args(&self.cflags);
        cmd.arg(source).arg("-o").arg(object);
        cmd
    }

    /// Build the link command producing `artifact`
    #[must_use]
    pub fn link_command(&self, objects: &[PathBuf], artifact: &Path, target: &ExtensionTarget) -> Command {
        let mut cmd = Command::new(&self.cc);
        cmd.arg(self.platform.shared_flag());
        if self.platform == TargetPlatform::Macos {
            // Python symbols resolve at import time
            cmd.args(["-undefined", "dynamic_lookup"]);
        }
        cmd.args(objects);
        cmd.arg("-o").arg(artifact);
        cmd.args(&self.ldflags);
        for library in &target.libraries {
            cmd.arg(format!("-l{library}"));
        }
        cmd
    }

    /// Compile one source. Output is appended to `log`.
    pub fn compile(
        &self,
        source: &Path,
        object: &Path,
        target: &ExtensionTarget,
        log: &mut String,
    ) -> Result<(), String> {
        if let Some(parent) = object.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| format!("Failed to create {}: {e}", parent.display()))?;
        }

        let mut cmd = self.compile_command(source, object, target);
        let step = format!("compile {}", source.display());
        run_captured(&mut cmd, &step, self.verbose, log)
    }

    /// Link objects into the module at `artifact`. Output is appended to `log`.
    pub fn link(
        &self,
        objects: &[PathBuf],
        artifact: &Path,
        target: &ExtensionTarget,
        log: &mut String,
    ) -> Result<(), String> {
        if let Some(parent) = artifact.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| format!("Failed to create {}: {e}", parent.display()))?;
        }

        let mut cmd = self.link_command(objects, artifact, target);
        run_captured(&mut cmd, "link", self.verbose, log)
    }
}

/// Find the Python header directory.
///
/// Priority: `PYTHON_INCLUDE` -> toolchain `python_include` -> ask the
/// interpreter (`PYTHON`, toolchain `python`, then `python3`).
fn detect_python_include(toolchain: &Toolchain) -> Option<PathBuf> {
    if let Some(dir) = crate::env_vars::python_include().or_else(|| toolchain.python_include.clone())
    {
        return Some(PathBuf::from(dir));
    }

    let python = crate::env_vars::python()
        .or_else(|| toolchain.python.clone())
        .unwrap_or_else(|| "python3".to_string());

    let output = Command::new(&python)
        .args([
            "-c",
            "import sysconfig; print(sysconfig.get_paths()['include'])",
        ])
        .output()
        .ok()?;

    output.status.success().then_some(())?;

    let include = String::from_utf8(output.stdout).ok()?.trim().to_string();
    crate::debug!("Python headers from {python}: {include}");
    (!include.is_empty()).then(|| PathBuf::from(include))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, reason = "Tests can panic")]
mod tests {
    use super::*;

    fn compiler(platform: TargetPlatform) -> CCompiler {
        CCompiler {
            cc: "cc".to_string(),
            cflags: vec!["-O2".to_string()],
            ldflags: Vec::new(),
            python_include: Some(PathBuf::from("/usr/include/python3")),
            platform,
            verbose: false,
        }
    }

    fn target() -> ExtensionTarget {
        ExtensionTarget {
            name: "connect".to_string(),
            module: "lib.wrapper.connect".to_string(),
            sources: vec![PathBuf::from("A.c")],
            libraries: vec!["ws2_32".to_string()],
            include_dirs: vec![PathBuf::from("inc")],
        }
    }

    fn args(cmd: &Command) -> Vec<String> {
        cmd.get_args()
            .map(|a| a.to_string_lossy().into_owned())
            .collect()
    }

    #[test]
    fn object_paths_are_unique_per_index() {
        let dir = Path::new("obj");
        let first = CCompiler::object_path(Path::new("a/DXFeed.c"), 0, dir);
        let second = CCompiler::object_path(Path::new("b/DXFeed.c"), 1, dir);
        assert_ne!(first, second);
        assert_eq!(first, dir.join("000-DXFeed.o"));
    }

    #[test]
    fn windows_compile_has_no_pic() {
        let cmd = compiler(TargetPlatform::Windows).compile_command(
            Path::new("A.c"),
            Path::new("A.o"),
            &target(),
        );
        let args = args(&cmd);

        assert!(!args.contains(&"-fPIC".to_string()));
        assert!(args.contains(&"-Iinc".to_string()));
        assert!(args.contains(&"-I/usr/include/python3".to_string()));
        assert!(args.contains(&"-O2".to_string()));
    }

    #[test]
    fn linux_compile_uses_pic() {
        let cmd = compiler(TargetPlatform::Linux).compile_command(
            Path::new("A.c"),
            Path::new("A.o"),
            &target(),
        );
        assert_eq!(args(&cmd).first().map(String::as_str), Some("-c"));
        assert!(args(&cmd).contains(&"-fPIC".to_string()));
    }

    #[test]
    fn link_adds_platform_libraries() {
        let cmd = compiler(TargetPlatform::Windows).link_command(
            &[PathBuf::from("A.o")],
            Path::new("connect.pyd"),
            &target(),
        );
        let args = args(&cmd);

        assert_eq!(args.first().map(String::as_str), Some("-shared"));
        assert_eq!(args.last().map(String::as_str), Some("-lws2_32"));
    }

    #[test]
    fn macos_link_defers_python_symbols() {
        let cmd = compiler(TargetPlatform::Macos).link_command(
            &[PathBuf::from("A.o")],
            Path::new("connect.so"),
            &target(),
        );
        let args = args(&cmd);
        assert!(args.contains(&"dynamic_lookup".to_string()));
    }
}
