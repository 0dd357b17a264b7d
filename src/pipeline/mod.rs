//! Pre-build pipeline
//!
//! Runs the build in a fixed order:
//! 1. remove the build directory (absent is fine)
//! 2. the `clear` phase
//! 3. the `build-extensions` phase
//! 4. the standard build step
//!
//! Everything is sequential and all-or-nothing: the first failing phase
//! stops the run, and nothing after it executes.

pub mod cleanup;
pub mod package;
pub mod phases;

pub use cleanup::remove_build_dir;
pub use package::PackageStep;
pub use phases::{BuildExtensionsPhase, ClearPhase, CommandPhase};

use crate::error::PipelineError;
use crate::extensions::{BuildResult, ExtensionTarget};
use crate::manifest::{PhaseSpec, Toolchain};
use crate::paths::Project;
use crate::platform::TargetPlatform;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

/// Everything a phase may need
#[derive(Debug, Clone)]
pub struct BuildContext {
    pub project: Project,
    pub platform: TargetPlatform,
    /// Assembled enabled targets
    pub targets: Vec<ExtensionTarget>,
    /// Effective toolchain (manifest merged with user defaults)
    pub toolchain: Toolchain,
    pub verbose: bool,
}

/// Outcome of one phase
#[derive(Debug, Clone, Serialize)]
pub struct PhaseResult {
    pub phase: String,
    pub success: bool,
    pub duration: Duration,
    /// Why the phase failed
    pub diagnostic: Option<String>,
    /// Captured tool output
    pub output: String,
    /// Per-target results, for phases that compile
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub builds: Vec<BuildResult>,
}

impl PhaseResult {
    #[must_use]
    pub const fn success(phase: String, duration: Duration, output: String) -> Self {
        Self {
            phase,
            success: true,
            duration,
            diagnostic: None,
            output,
            builds: Vec::new(),
        }
    }

    #[must_use]
    pub const fn failure(
        phase: String,
        duration: Duration,
        diagnostic: String,
        output: String,
    ) -> Self {
        Self {
            phase,
            success: false,
            duration,
            diagnostic: Some(diagnostic),
            output,
            builds: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_builds(mut self, builds: Vec<BuildResult>) -> Self {
        self.builds = builds;
        self
    }
}

/// A single pipeline step
pub trait Phase: fmt::Debug {
    /// Name used in logs, reports and errors
    fn name(&self) -> &str;

    /// Run to completion. Failures are reported in the result.
    fn run(&self, ctx: &BuildContext) -> PhaseResult;
}

/// Progress callbacks for a pipeline run
pub trait PipelineObserver {
    fn build_dir_removed(&mut self, _path: &Path, _existed: bool) {}

    fn phase_started(&mut self, _name: &str) {}

    fn phase_finished(&mut self, _result: &PhaseResult) {}
}

#[derive(Debug, Clone, Copy, Default)]
struct Silent;

impl PipelineObserver for Silent {}

/// Summary of a successful run
#[derive(Debug, Clone, Serialize)]
pub struct PipelineReport {
    pub started_at: DateTime<Utc>,
    pub platform: TargetPlatform,
    pub build_dir: PathBuf,
    pub duration: Duration,
    /// Pre-build phases followed by the standard step
    pub phases: Vec<PhaseResult>,
}

impl PipelineReport {
    /// Artifacts produced by all phases
    pub fn artifacts(&self) -> impl Iterator<Item = &Path> {
        self.phases
            .iter()
            .flat_map(|p| &p.builds)
            .filter_map(|b| b.artifact.as_deref())
    }
}

/// Ordered pre-build phases plus the standard step
#[derive(Debug)]
pub struct Pipeline {
    phases: Vec<Box<dyn Phase>>,
    standard: Box<dyn Phase>,
}

impl Pipeline {
    /// Pipeline with no pre-build phases
    #[must_use]
    pub fn new(standard: Box<dyn Phase>) -> Self {
        Self {
            phases: Vec::new(),
            standard,
        }
    }

    /// Append a pre-build phase
    #[must_use]
    pub fn with_phase(mut self, phase: Box<dyn Phase>) -> Self {
        self.phases.push(phase);
        self
    }

    /// Standard pipeline for a manifest: clear, build-extensions, package
    #[must_use]
    pub fn standard(phases: &crate::manifest::Phases) -> Self {
        let clear: Box<dyn Phase> = match &phases.clear {
            PhaseSpec::Builtin => Box::new(ClearPhase),
            PhaseSpec::Command { argv } => Box::new(CommandPhase::new("clear", argv.clone())),
        };
        let build: Box<dyn Phase> = match &phases.build {
            PhaseSpec::Builtin => Box::new(BuildExtensionsPhase),
            PhaseSpec::Command { argv } => {
                Box::new(CommandPhase::new("build-extensions", argv.clone()))
            }
        };

        Self::new(Box::new(PackageStep))
            .with_phase(clear)
            .with_phase(build)
    }

    /// Names in execution order, standard step last
    #[must_use]
    pub fn phase_names(&self) -> Vec<&str> {
        self.phases
            .iter()
            .map(|p| p.name())
            .chain(std::iter::once(self.standard.name()))
            .collect()
    }

    /// Run the pipeline without progress reporting
    pub fn run(&self, ctx: &BuildContext) -> Result<PipelineReport, PipelineError> {
        self.run_observed(ctx, &mut Silent)
    }

    /// Run the pipeline, reporting progress to `observer`
    pub fn run_observed(
        &self,
        ctx: &BuildContext,
        observer: &mut dyn PipelineObserver,
    ) -> Result<PipelineReport, PipelineError> {
        let started_at = Utc::now();
        let start = Instant::now();
        let build_dir = ctx.project.build_dir();

        let existed = remove_build_dir(&build_dir)?;
        observer.build_dir_removed(&build_dir, existed);

        let mut results = Vec::with_capacity(self.phases.len() + 1);
        for phase in self.phases.iter().chain(std::iter::once(&self.standard)) {
            observer.phase_started(phase.name());
            crate::debug!("Starting phase {}", phase.name());

            let result = phase.run(ctx);
            observer.phase_finished(&result);

            if !result.success {
                return Err(PipelineError::PhaseFailed {
                    phase: result.phase,
                    diagnostic: result
                        .diagnostic
                        .unwrap_or_else(|| "no diagnostic".to_string()),
                });
            }
            results.push(result);
        }

        Ok(PipelineReport {
            started_at,
            platform: ctx.platform,
            build_dir,
            duration: start.elapsed(),
            phases: results,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, reason = "Tests can panic")]
mod tests {
    use super::*;
    use crate::manifest::{Manifest, Phases};
    use std::fs;
    use std::sync::{Arc, Mutex};
    use tempfile::TempDir;

    /// Records its name into a shared log and succeeds or fails on demand
    #[derive(Debug)]
    struct Recording {
        name: &'static str,
        succeed: bool,
        log: Arc<Mutex<Vec<&'static str>>>,
    }

    impl Phase for Recording {
        fn name(&self) -> &str {
            self.name
        }

        fn run(&self, _ctx: &BuildContext) -> PhaseResult {
            self.log.lock().unwrap().push(self.name);
            if self.succeed {
                PhaseResult::success(self.name.to_string(), Duration::ZERO, String::new())
            } else {
                PhaseResult::failure(
                    self.name.to_string(),
                    Duration::ZERO,
                    "exit code: 1".to_string(),
                    String::new(),
                )
            }
        }
    }

    fn context(root: &Path) -> BuildContext {
        BuildContext {
            project: Project {
                manifest: Manifest::default(),
                root: root.to_path_buf(),
                manifest_path: None,
            },
            platform: TargetPlatform::Windows,
            targets: Vec::new(),
            toolchain: Toolchain::default(),
            verbose: false,
        }
    }

    fn pipeline(clear_ok: bool, build_ok: bool, log: &Arc<Mutex<Vec<&'static str>>>) -> Pipeline {
        let phase = |name, succeed| -> Box<dyn Phase> {
            Box::new(Recording {
                name,
                succeed,
                log: Arc::clone(log),
            })
        };

        Pipeline::new(phase("standard", true))
            .with_phase(phase("clear", clear_ok))
            .with_phase(phase("build-extensions", build_ok))
    }

    #[test]
    fn phases_run_in_order_then_standard_once() {
        let temp = TempDir::new().unwrap();
        let log = Arc::new(Mutex::new(Vec::new()));

        let report = pipeline(true, true, &log).run(&context(temp.path())).unwrap();

        assert_eq!(
            *log.lock().unwrap(),
            vec!["clear", "build-extensions", "standard"]
        );
        assert_eq!(report.phases.len(), 3);
        assert_eq!(report.phases.last().map(|p| p.phase.as_str()), Some("standard"));
    }

    #[test]
    fn failing_clear_stops_everything() {
        let temp = TempDir::new().unwrap();
        let log = Arc::new(Mutex::new(Vec::new()));

        let err = pipeline(false, true, &log)
            .run(&context(temp.path()))
            .unwrap_err();

        assert_eq!(*log.lock().unwrap(), vec!["clear"]);
        assert!(matches!(
            err,
            PipelineError::PhaseFailed { ref phase, .. } if phase == "clear"
        ));
    }

    #[test]
    fn failing_build_skips_standard_step() {
        let temp = TempDir::new().unwrap();
        let log = Arc::new(Mutex::new(Vec::new()));

        let err = pipeline(true, false, &log)
            .run(&context(temp.path()))
            .unwrap_err();

        assert_eq!(*log.lock().unwrap(), vec!["clear", "build-extensions"]);
        assert!(err.to_string().contains("exit code: 1"));
    }

    #[test]
    fn stale_build_dir_is_removed_first() {
        let temp = TempDir::new().unwrap();
        let stale = temp.path().join("build").join("lib").join("stale.so");
        fs::create_dir_all(stale.parent().unwrap()).unwrap();
        fs::write(&stale, "old").unwrap();

        let log = Arc::new(Mutex::new(Vec::new()));
        pipeline(true, true, &log).run(&context(temp.path())).unwrap();

        assert!(!stale.exists());
    }

    #[test]
    fn standard_pipeline_follows_manifest() {
        let builtin = Pipeline::standard(&Phases::default());
        assert_eq!(
            builtin.phase_names(),
            vec!["clear", "build-extensions", "package"]
        );

        let legacy = Pipeline::standard(&Phases {
            clear: PhaseSpec::Command {
                argv: vec!["python".to_string(), "-c".to_string(), "from clear import *;".to_string()],
            },
            build: PhaseSpec::Builtin,
        });
        assert_eq!(
            legacy.phase_names(),
            vec!["clear", "build-extensions", "package"]
        );
    }
}
