//! Build manifest
//!
//! `pcapi.toml` declares everything the orchestrator needs: where the native
//! client sources live, which extension targets exist (and which of them are
//! enabled), per-platform exclusions and link libraries, how each pre-build
//! phase runs, and toolchain overrides.
//!
//! Without a manifest the built-in default is used. It describes the
//! standard layout: the dxFeed C API vendored under `lib/dxfeed-c-api` and
//! the Cython wrappers under `lib/wrapper`.

use crate::error::ConfigError;
use crate::platform::TargetPlatform;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

/// File name of the project manifest
pub const MANIFEST_FILE: &str = "pcapi.toml";

/// Manifest written by `pcapi-build init`
pub const MANIFEST_TEMPLATE: &str = r#"# pcapi-build manifest

[project]
name = "pcapi"
packages = ["lib"]
package_suffixes = ["py", "pxd"]
build_dir = "build"

[native]
source_dir = "lib/dxfeed-c-api/src"
suffix = "c"
include_dirs = ["lib/dxfeed-c-api/include", "lib/dxfeed-c-api/src"]

[[target]]
name = "connect"
module = "lib.wrapper.connect"
bindings = ["lib/wrapper/connect.pyx"]
enabled = true

# Toggle with `pcapi-build enable subscribe`
[[target]]
name = "subscribe"
module = "lib.wrapper.subscribe"
bindings = ["lib/wrapper/subscribe.pyx"]
extra_include_dirs = ["lib/wrapper/pxd_include"]
enabled = false

# Linux.c needs POSIX symbols the Windows build does not provide
[platforms.windows]
exclude = [{ file = "Linux.c" }]
libraries = ["ws2_32"]

[platforms.linux]
libraries = ["pthread"]

[platforms.macos]
libraries = ["pthread"]

[phases]
clear = { kind = "builtin" }
build = { kind = "builtin" }

[toolchain]
cython_args = ["-3"]
"#;

/// Parsed `pcapi.toml`
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Manifest {
    pub project: ProjectSection,

    pub native: NativeSources,

    /// Declared extension targets, enabled or not
    #[serde(default, rename = "target")]
    pub targets: Vec<TargetSpec>,

    /// Per-platform profiles keyed by platform name
    #[serde(default)]
    pub platforms: BTreeMap<String, PlatformProfile>,

    #[serde(default)]
    pub phases: Phases,

    #[serde(default)]
    pub toolchain: Toolchain,
}

/// The `[project]` table
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ProjectSection {
    pub name: String,

    /// Package directories copied by the standard build step
    #[serde(default)]
    pub packages: Vec<String>,

    /// File suffixes copied from package directories
    #[serde(default = "default_package_suffixes")]
    pub package_suffixes: Vec<String>,

    /// Build output directory, relative to the project root
    #[serde(default = "default_build_dir")]
    pub build_dir: String,
}

/// The shared native source set
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct NativeSources {
    pub source_dir: String,

    #[serde(default = "default_suffix")]
    pub suffix: String,

    #[serde(default)]
    pub include_dirs: Vec<String>,
}

/// One declared extension target
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct TargetSpec {
    pub name: String,

    /// Dotted import path of the compiled module
    pub module: String,

    /// Wrapper binding sources compiled ahead of the shared native set
    #[serde(default)]
    pub bindings: Vec<String>,

    #[serde(default)]
    pub extra_include_dirs: Vec<String>,

    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

/// Platform-specific exclusions and link libraries
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct PlatformProfile {
    #[serde(default)]
    pub exclude: Vec<ExclusionRule>,

    #[serde(default)]
    pub libraries: Vec<String>,
}

/// A native source excluded from a platform's build
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum ExclusionRule {
    /// A specific file that must exist in the source directory
    File { file: String },
    /// A file-name regex; matching nothing is not an error
    Pattern { pattern: String },
}

/// How each pre-build phase is carried out
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct Phases {
    #[serde(default)]
    pub clear: PhaseSpec,

    #[serde(default)]
    pub build: PhaseSpec,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum PhaseSpec {
    /// In-process implementation
    #[default]
    Builtin,
    /// Legacy phase script; the exit code is the entire result
    Command { argv: Vec<String> },
}

/// Toolchain overrides
///
/// Environment variables take precedence, then the manifest, then the
/// user-level `toolchain.toml`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct Toolchain {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cc: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cython: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub cython_args: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub python: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub python_include: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub cflags: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ldflags: Vec<String>,
}

fn default_package_suffixes() -> Vec<String> {
    vec!["py".to_string(), "pxd".to_string()]
}

fn default_build_dir() -> String {
    "build".to_string()
}

fn default_suffix() -> String {
    "c".to_string()
}

const fn default_enabled() -> bool {
    true
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| (*s).to_string()).collect()
}

impl Default for Manifest {
    fn default() -> Self {
        let mut platforms = BTreeMap::new();
        platforms.insert(
            TargetPlatform::Windows.as_str().to_string(),
            PlatformProfile {
                exclude: vec![ExclusionRule::File {
                    file: "Linux.c".to_string(),
                }],
                libraries: strings(&["ws2_32"]),
            },
        );
        for platform in [TargetPlatform::Linux, TargetPlatform::Macos] {
            platforms.insert(
                platform.as_str().to_string(),
                PlatformProfile {
                    exclude: Vec::new(),
                    libraries: strings(&["pthread"]),
                },
            );
        }

        Self {
            project: ProjectSection {
                name: "pcapi".to_string(),
                packages: strings(&["lib"]),
                package_suffixes: default_package_suffixes(),
                build_dir: default_build_dir(),
            },
            native: NativeSources {
                source_dir: "lib/dxfeed-c-api/src".to_string(),
                suffix: default_suffix(),
                include_dirs: strings(&["lib/dxfeed-c-api/include", "lib/dxfeed-c-api/src"]),
            },
            targets: vec![
                TargetSpec {
                    name: "connect".to_string(),
                    module: "lib.wrapper.connect".to_string(),
                    bindings: strings(&["lib/wrapper/connect.pyx"]),
                    extra_include_dirs: Vec::new(),
                    enabled: true,
                },
                TargetSpec {
                    name: "subscribe".to_string(),
                    module: "lib.wrapper.subscribe".to_string(),
                    bindings: strings(&["lib/wrapper/subscribe.pyx"]),
                    extra_include_dirs: strings(&["lib/wrapper/pxd_include"]),
                    enabled: false,
                },
            ],
            platforms,
            phases: Phases::default(),
            toolchain: Toolchain {
                cython_args: strings(&["-3"]),
                ..Toolchain::default()
            },
        }
    }
}

impl Manifest {
    /// Parse manifest content. `path` is only used for error messages.
    ///
    /// Platform keys are validated so a typo such as `[platforms.win]`
    /// fails loudly instead of silently disabling exclusions.
    pub fn parse(content: &str, path: &Path) -> Result<Self, ConfigError> {
        let manifest: Self = toml::from_str(content).map_err(|e| ConfigError::ManifestParse {
            path: path.to_path_buf(),
            source: Box::new(e),
        })?;

        for key in manifest.platforms.keys() {
            key.parse::<TargetPlatform>()?;
        }

        Ok(manifest)
    }

    /// Load a manifest from disk.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read manifest {}", path.display()))?;
        Ok(Self::parse(&content, path)?)
    }

    /// Write the manifest back to disk.
    ///
    /// Comments in the original file are not preserved.
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self).context("Failed to serialize manifest")?;
        fs::write(path, content)
            .with_context(|| format!("Failed to write manifest {}", path.display()))
    }

    /// Look up a declared target by name
    #[must_use]
    pub fn target(&self, name: &str) -> Option<&TargetSpec> {
        self.targets.iter().find(|t| t.name == name)
    }

    /// Targets that take part in the build, in declaration order
    pub fn enabled_targets(&self) -> impl Iterator<Item = &TargetSpec> {
        self.targets.iter().filter(|t| t.enabled)
    }

    /// Enable or disable a target.
    ///
    /// Returns whether the flag actually changed.
    pub fn set_enabled(&mut self, name: &str, enabled: bool) -> Result<bool, ConfigError> {
        let target = self
            .targets
            .iter_mut()
            .find(|t| t.name == name)
            .ok_or_else(|| ConfigError::UnknownTarget(name.to_string()))?;

        let changed = target.enabled != enabled;
        target.enabled = enabled;
        Ok(changed)
    }

    /// Profile for a platform; platforms without an entry get an empty one
    #[must_use]
    pub fn platform_profile(&self, platform: TargetPlatform) -> PlatformProfile {
        self.platforms
            .get(platform.as_str())
            .cloned()
            .unwrap_or_default()
    }
}

impl Toolchain {
    /// Load user-level toolchain defaults.
    ///
    /// Reads `$XDG_CONFIG_HOME/pcapi-build/toolchain.toml` or
    /// `~/.config/pcapi-build/toolchain.toml`. A missing file yields defaults.
    pub fn load_user_defaults() -> Result<Self> {
        let Some(path) = Self::user_config_dir().map(|dir| dir.join("toolchain.toml")) else {
            return Ok(Self::default());
        };

        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        toml::from_str(&content).with_context(|| format!("Failed to parse {}", path.display()))
    }

    fn user_config_dir() -> Option<PathBuf> {
        if let Ok(xdg_config) = env::var("XDG_CONFIG_HOME") {
            return Some(PathBuf::from(xdg_config).join("pcapi-build"));
        }

        dirs::home_dir().map(|home| home.join(".config").join("pcapi-build"))
    }

    /// Fill unset fields from `fallback`.
    #[must_use]
    pub fn or(self, fallback: Self) -> Self {
        let or_vec = |primary: Vec<String>, fallback: Vec<String>| {
            if primary.is_empty() { fallback } else { primary }
        };

        Self {
            cc: self.cc.or(fallback.cc),
            cython: self.cython.or(fallback.cython),
            cython_args: or_vec(self.cython_args, fallback.cython_args),
            python: self.python.or(fallback.python),
            python_include: self.python_include.or(fallback.python_include),
            cflags: or_vec(self.cflags, fallback.cflags),
            ldflags: or_vec(self.ldflags, fallback.ldflags),
        }
    }
}
