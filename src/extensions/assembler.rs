//! Extension target assembly
//!
//! Turns the manifest's declared targets into resolved [`ExtensionTarget`]s
//! for one platform. Disabled targets are skipped; the shared native source
//! set is computed once and reused by every enabled target.

use super::sources::platform_sources;
use super::types::ExtensionTarget;
use crate::error::ConfigError;
use crate::paths::Project;
use crate::platform::TargetPlatform;

/// Assemble every enabled target for `platform`.
///
/// Fails when the source directory or a named exclusion is missing, or when
/// no target is enabled.
pub fn assemble(
    project: &Project,
    platform: TargetPlatform,
) -> Result<Vec<ExtensionTarget>, ConfigError> {
    let manifest = &project.manifest;

    if manifest.enabled_targets().next().is_none() {
        return Err(ConfigError::NoActiveTargets);
    }

    let profile = manifest.platform_profile(platform);
    let source_dir = project.resolve(&manifest.native.source_dir);
    let shared = platform_sources(
        &source_dir,
        &manifest.native.suffix,
        platform,
        &profile.exclude,
    )?;

    crate::debug!(
        "Collected {} native sources from {} for {platform}",
        shared.len(),
        source_dir.display()
    );

    let targets = manifest
        .enabled_targets()
        .map(|spec| {
            let sources = spec
                .bindings
                .iter()
                .map(|b| project.resolve(b))
                .chain(shared.iter().cloned())
                .collect();

            let include_dirs = manifest
                .native
                .include_dirs
                .iter()
                .chain(&spec.extra_include_dirs)
                .map(|dir| project.resolve(dir))
                .collect();

            ExtensionTarget {
                name: spec.name.clone(),
                module: spec.module.clone(),
                sources,
                libraries: profile.libraries.clone(),
                include_dirs,
            }
        })
        .collect();

    Ok(targets)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, reason = "Tests can panic")]
mod tests {
    use super::*;
    use crate::manifest::Manifest;
    use std::fs;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn project_with_sources(files: &[&str]) -> (TempDir, Project) {
        let temp = TempDir::new().unwrap();
        let src = temp.path().join("lib/dxfeed-c-api/src");
        fs::create_dir_all(&src).unwrap();
        for file in files {
            fs::write(src.join(file), "").unwrap();
        }

        let project = Project {
            manifest: Manifest::default(),
            root: temp.path().to_path_buf(),
            manifest_path: None,
        };
        (temp, project)
    }

    #[test]
    fn windows_target_matches_expected_sources() {
        let (temp, project) = project_with_sources(&["A.c", "B.c", "Linux.c"]);

        let targets = assemble(&project, TargetPlatform::Windows).unwrap();
        assert_eq!(targets.len(), 1);

        let connect = targets.first().unwrap();
        let src = temp.path().join("lib/dxfeed-c-api/src");
        assert_eq!(
            connect.sources,
            vec![
                temp.path().join("lib/wrapper/connect.pyx"),
                src.join("A.c"),
                src.join("B.c"),
            ]
        );
        assert_eq!(connect.libraries, vec!["ws2_32".to_string()]);
        assert!(!connect.contains_source("Linux.c"));
    }

    #[test]
    fn linux_target_keeps_linux_source() {
        let (_temp, project) = project_with_sources(&["A.c", "Linux.c"]);

        let targets = assemble(&project, TargetPlatform::Linux).unwrap();
        let connect = targets.first().unwrap();
        assert!(connect.contains_source("Linux.c"));
        assert_eq!(connect.libraries, vec!["pthread".to_string()]);
    }

    #[test]
    fn enabling_second_target_shares_native_sources() {
        let (temp, mut project) = project_with_sources(&["A.c", "B.c", "Linux.c"]);
        let before = assemble(&project, TargetPlatform::Windows).unwrap();

        project.manifest.set_enabled("subscribe", true).unwrap();
        let after = assemble(&project, TargetPlatform::Windows).unwrap();

        assert_eq!(after.len(), 2);
        assert_eq!(after.first(), before.first());

        let subscribe = after.get(1).unwrap();
        assert_eq!(subscribe.module, "lib.wrapper.subscribe");
        assert!(!subscribe.contains_source("Linux.c"));
        assert_eq!(
            subscribe.include_dirs.last(),
            Some(&temp.path().join("lib/wrapper/pxd_include"))
        );
        assert_eq!(
            subscribe.sources.get(1..),
            before.first().and_then(|c| c.sources.get(1..))
        );
    }

    #[test]
    fn no_enabled_targets_is_config_error() {
        let (_temp, mut project) = project_with_sources(&["A.c", "Linux.c"]);
        project.manifest.set_enabled("connect", false).unwrap();

        let err = assemble(&project, TargetPlatform::Windows).unwrap_err();
        assert!(matches!(err, ConfigError::NoActiveTargets));
    }

    #[test]
    fn missing_source_dir_is_config_error() {
        let temp = TempDir::new().unwrap();
        let project = Project {
            manifest: Manifest::default(),
            root: temp.path().to_path_buf(),
            manifest_path: None,
        };

        let err = assemble(&project, TargetPlatform::Linux).unwrap_err();
        assert!(matches!(err, ConfigError::SourceDirMissing { ref path } if *path == PathBuf::from(temp.path()).join("lib/dxfeed-c-api/src")));
    }
}
