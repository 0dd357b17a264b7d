//! Build command
//!
//! Assemble targets, then run the pipeline: clean the build directory, run
//! `clear` and `build-extensions`, then the standard step.

use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use pcapi_build::extensions::ExtensionBuilder;
use pcapi_build::{
    BuildContext, PhaseResult, Pipeline, PipelineObserver, assemble, load_project,
    resolve_platform,
};
use std::fs;
use std::path::Path;
use std::time::Duration;

/// Spinner per phase; collects results for the report
struct Progress {
    quiet: bool,
    verbose: bool,
    current: Option<ProgressBar>,
    results: Vec<PhaseResult>,
}

impl Progress {
    const fn new(quiet: bool, verbose: bool) -> Self {
        Self {
            quiet,
            verbose,
            current: None,
            results: Vec::new(),
        }
    }
}

impl PipelineObserver for Progress {
    fn build_dir_removed(&mut self, path: &Path, existed: bool) {
        if self.verbose && existed {
            println!("Removed {}", path.display());
        }
    }

    fn phase_started(&mut self, name: &str) {
        if self.quiet {
            return;
        }

        let spinner = ProgressBar::new_spinner();
        spinner.set_style(
            ProgressStyle::with_template("{spinner:.green} {msg} [{elapsed}]")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        spinner.set_message(format!("Running {name}"));
        spinner.enable_steady_tick(Duration::from_millis(100));
        self.current = Some(spinner);
    }

    fn phase_finished(&mut self, result: &PhaseResult) {
        if let Some(spinner) = self.current.take() {
            let mark = if result.success { "ok" } else { "FAILED" };
            spinner.finish_with_message(format!(
                "{} {mark} ({:.2}s)",
                result.phase,
                result.duration.as_secs_f64()
            ));
        }

        if self.verbose && !result.output.is_empty() {
            print!("{}", result.output);
        }

        if !result.success && !self.quiet && !self.verbose && !result.output.is_empty() {
            eprint!("{}", result.output);
        }

        self.results.push(result.clone());
    }
}

pub(crate) fn run(
    manifest: Option<&str>,
    platform: Option<&str>,
    verbose: bool,
    quiet: bool,
    report: Option<&Path>,
) -> Result<()> {
    let project = load_project(manifest)?;
    let platform = resolve_platform(platform)?;

    // Configuration errors surface before anything is deleted
    let targets = assemble(&project, platform)?;
    let toolchain = super::effective_toolchain(&project)?;

    if !quiet {
        let names: Vec<_> = targets.iter().map(|t| t.name.as_str()).collect();
        println!("Building {} for {platform}", names.join(", "));
    }

    let ctx = BuildContext {
        project,
        platform,
        targets,
        toolchain,
        verbose,
    };
    let pipeline = Pipeline::standard(&ctx.project.manifest.phases);

    let mut progress = Progress::new(quiet, verbose);
    let outcome = pipeline.run_observed(&ctx, &mut progress);

    if let Some(path) = report {
        let document = match &outcome {
            Ok(report) => serde_json::json!({
                "success": true,
                "report": report,
            }),
            Err(e) => serde_json::json!({
                "success": false,
                "error": e.to_string(),
                "platform": platform,
                "phases": progress.results,
            }),
        };
        write_report(path, &document)?;
    }

    let report = outcome?;

    if !quiet {
        let builds: Vec<_> = report
            .phases
            .iter()
            .flat_map(|p| p.builds.iter().cloned())
            .collect();
        let (successful, _failed, duration) = ExtensionBuilder::summarize(&builds);

        println!();
        println!(
            "Built {successful} extension(s) in {:.2}s",
            duration.as_secs_f64()
        );
        for artifact in report.artifacts() {
            println!("  {}", artifact.display());
        }
    }

    Ok(())
}

fn write_report(path: &Path, document: &serde_json::Value) -> Result<()> {
    let content = serde_json::to_string_pretty(document)?;
    fs::write(path, content).with_context(|| format!("Failed to write report {}", path.display()))
}
