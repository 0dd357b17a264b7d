//! Target platform detection
//!
//! The platform decides which native sources are excluded and which system
//! libraries are linked. It defaults to the host and can be overridden with
//! `--platform` or `PCAPI_TARGET_PLATFORM`.

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::env;
use std::fmt;
use std::str::FromStr;

/// Platforms an extension can be built for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetPlatform {
    Windows,
    Linux,
    Macos,
}

impl TargetPlatform {
    /// All supported platforms, in manifest order
    pub const ALL: [Self; 3] = [Self::Windows, Self::Linux, Self::Macos];

    /// Manifest key for this platform
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Windows => "windows",
            Self::Linux => "linux",
            Self::Macos => "macos",
        }
    }

    /// File suffix of an importable compiled module on this platform
    #[must_use]
    pub const fn module_suffix(self) -> &'static str {
        match self {
            Self::Windows => "pyd",
            Self::Linux | Self::Macos => "so",
        }
    }

    /// Whether objects must be compiled as position-independent code
    #[must_use]
    pub const fn needs_pic(self) -> bool {
        !matches!(self, Self::Windows)
    }

    /// Linker flag producing a loadable module
    #[must_use]
    pub const fn shared_flag(self) -> &'static str {
        match self {
            Self::Macos => "-bundle",
            Self::Windows | Self::Linux => "-shared",
        }
    }

    /// Map a Rust `target_os` string to a platform
    #[must_use]
    pub fn from_os(os: &str) -> Option<Self> {
        match os {
            "windows" => Some(Self::Windows),
            "linux" => Some(Self::Linux),
            "macos" => Some(Self::Macos),
            _ => None,
        }
    }
}

impl fmt::Display for TargetPlatform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TargetPlatform {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "windows" | "win32" | "win64" | "mingw32" => Ok(Self::Windows),
            "linux" => Ok(Self::Linux),
            "macos" | "darwin" | "osx" => Ok(Self::Macos),
            other => Err(ConfigError::UnknownPlatform(other.to_string())),
        }
    }
}

/// Detect the host platform.
///
/// Unsupported hosts fall back to `linux`, the most permissive profile.
#[must_use]
pub fn detect_host_platform() -> TargetPlatform {
    TargetPlatform::from_os(env::consts::OS).unwrap_or(TargetPlatform::Linux)
}

/// Resolve the platform to build for.
///
/// Priority: explicit flag -> `PCAPI_TARGET_PLATFORM` -> host.
pub fn resolve_platform(flag: Option<&str>) -> Result<TargetPlatform, ConfigError> {
    if let Some(value) = flag {
        return value.parse();
    }

    if let Some(value) = crate::env_vars::target_platform() {
        return value.parse();
    }

    Ok(detect_host_platform())
}
