//! Native source collection
//!
//! Gathers the shared native source set from the fixed source directory and
//! removes the sources a platform cannot build. The result is the same for
//! every target, so enabling another target never touches this code.

use crate::error::ConfigError;
use crate::manifest::ExclusionRule;
use crate::platform::TargetPlatform;
use regex::Regex;
use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};

/// Collect all files in `dir` whose extension is `suffix`.
///
/// Only the top level is scanned. The result is sorted so repeated runs
/// compile in the same order. A missing directory is
/// [`ConfigError::SourceDirMissing`]; any other read failure is
/// [`ConfigError::SourceDirUnreadable`].
pub fn collect_sources(dir: &Path, suffix: &str) -> Result<Vec<PathBuf>, ConfigError> {
    let unreadable = |source: io::Error| {
        if source.kind() == io::ErrorKind::NotFound {
            ConfigError::SourceDirMissing {
                path: dir.to_path_buf(),
            }
        } else {
            ConfigError::SourceDirUnreadable {
                path: dir.to_path_buf(),
                source,
            }
        }
    };

    let mut sources = Vec::new();
    for entry in fs::read_dir(dir).map_err(unreadable)? {
        let path = entry.map_err(unreadable)?.path();
        if path.is_file() && path.extension().is_some_and(|ext| ext == suffix) {
            sources.push(path);
        }
    }

    sources.sort();
    Ok(sources)
}

/// Whether `name` names a file directly inside the source directory
fn is_plain_file_name(name: &str) -> bool {
    let mut components = Path::new(name).components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(first)), None) if first == name
    ) && !name.contains(['/', '\\'])
}

/// Compiled form of a platform's exclusion rules
#[derive(Debug)]
pub struct ExclusionFilter {
    platform: TargetPlatform,
    files: Vec<String>,
    patterns: Vec<Regex>,
}

impl ExclusionFilter {
    /// Compile the rules for `platform`.
    pub fn new(platform: TargetPlatform, rules: &[ExclusionRule]) -> Result<Self, ConfigError> {
        let mut files = Vec::new();
        let mut patterns = Vec::new();

        for rule in rules {
            match rule {
                ExclusionRule::File { file } => {
                    if !is_plain_file_name(file) {
                        return Err(ConfigError::InvalidExclusion {
                            name: file.clone(),
                            platform: platform.to_string(),
                        });
                    }
                    files.push(file.clone());
                }
                ExclusionRule::Pattern { pattern } => {
                    let regex = Regex::new(pattern).map_err(|e| ConfigError::InvalidPattern {
                        pattern: pattern.clone(),
                        source: Box::new(e),
                    })?;
                    patterns.push(regex);
                }
            }
        }

        Ok(Self {
            platform,
            files,
            patterns,
        })
    }

    /// Check that every named exclusion is one of the collected `sources`.
    ///
    /// Names are compared exactly, the same way [`Self::excludes`] matches,
    /// so a rule that passes here always removes its file. A miss means the
    /// manifest and the vendored library disagree.
    pub fn verify(&self, dir: &Path, sources: &[PathBuf]) -> Result<(), ConfigError> {
        let missing = self.files.iter().find(|name| {
            !sources
                .iter()
                .any(|path| path.file_name().is_some_and(|n| n == name.as_str()))
        });

        match missing {
            Some(name) => Err(ConfigError::ExclusionMissing {
                name: name.clone(),
                dir: dir.to_path_buf(),
                platform: self.platform.to_string(),
            }),
            None => Ok(()),
        }
    }

    /// Whether `path` is excluded
    #[must_use]
    pub fn excludes(&self, path: &Path) -> bool {
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            return false;
        };

        self.files.iter().any(|f| f == name) || self.patterns.iter().any(|p| p.is_match(name))
    }

    /// Drop excluded sources, keeping order
    #[must_use]
    pub fn apply(&self, sources: Vec<PathBuf>) -> Vec<PathBuf> {
        sources
            .into_iter()
            .filter(|path| {
                let excluded = self.excludes(path);
                if excluded {
                    crate::debug!("Excluding {} for {}", path.display(), self.platform);
                }
                !excluded
            })
            .collect()
    }
}

/// Collect the shared native source set for `platform`.
pub fn platform_sources(
    dir: &Path,
    suffix: &str,
    platform: TargetPlatform,
    rules: &[ExclusionRule],
) -> Result<Vec<PathBuf>, ConfigError> {
    let sources = collect_sources(dir, suffix)?;
    let filter = ExclusionFilter::new(platform, rules)?;
    filter.verify(dir, &sources)?;
    Ok(filter.apply(sources))
}
