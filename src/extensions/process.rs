//! Child process helpers shared by the toolchain wrappers and legacy phases.

use std::path::PathBuf;
use std::process::{Command, ExitStatus};

/// Describe an exit status for error messages
#[must_use]
pub fn describe_status(status: ExitStatus) -> String {
    status
        .code()
        .map_or_else(|| "unknown".to_string(), |c| c.to_string())
}

/// Run `cmd` to completion, appending its stdout and stderr to `log`.
///
/// Returns a one-line error when the process cannot be started or exits
/// non-zero. The exit code is the only signal inspected.
pub fn run_captured(cmd: &mut Command, step: &str, verbose: bool, log: &mut String) -> Result<(), String> {
    if verbose {
        log.push_str(&format!("  Running: {}\n", render_command(cmd)));
    }
    crate::debug!("Running {step}: {}", render_command(cmd));

    let output = cmd
        .output()
        .map_err(|e| format!("Failed to run {step}: {e}"))?;

    log.push_str(&String::from_utf8_lossy(&output.stdout));
    log.push_str(&String::from_utf8_lossy(&output.stderr));

    if output.status.success() {
        Ok(())
    } else {
        Err(format!(
            "{step} failed with exit code: {}",
            describe_status(output.status)
        ))
    }
}

/// Render a command line for logs
#[must_use]
pub fn render_command(cmd: &Command) -> String {
    std::iter::once(cmd.get_program())
        .chain(cmd.get_args())
        .map(|part| part.to_string_lossy().into_owned())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Locate an executable on `PATH`
pub fn find_in_path(name: &str) -> Option<PathBuf> {
    let locator = if cfg!(windows) { "where" } else { "which" };

    let output = Command::new(locator).arg(name).output().ok()?;
    if !output.status.success() {
        return None;
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    let path = PathBuf::from(stdout.lines().next()?.trim());
    path.exists().then_some(path)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, reason = "Tests can panic")]
mod tests {
    use super::*;

    #[test]
    fn renders_program_and_args() {
        let mut cmd = Command::new("cc");
        cmd.args(["-c", "A.c", "-o", "A.o"]);
        assert_eq!(render_command(&cmd), "cc -c A.c -o A.o");
    }

    #[test]
    fn missing_program_reports_step() {
        let mut cmd = Command::new("pcapi-build-surely-missing-program");
        let mut log = String::new();

        let err = run_captured(&mut cmd, "binding generator", false, &mut log).unwrap_err();
        assert!(err.starts_with("Failed to run binding generator"));
    }

    #[cfg(unix)]
    #[test]
    fn nonzero_exit_is_failure_with_code() {
        let mut cmd = Command::new("sh");
        cmd.args(["-c", "echo partial; exit 3"]);
        let mut log = String::new();

        let err = run_captured(&mut cmd, "clear", false, &mut log).unwrap_err();
        assert_eq!(err, "clear failed with exit code: 3");
        assert!(log.contains("partial"));
    }

    #[cfg(unix)]
    #[test]
    fn zero_exit_is_success() {
        let mut cmd = Command::new("true");
        let mut log = String::new();
        assert!(run_captured(&mut cmd, "noop", true, &mut log).is_ok());
        assert!(log.contains("Running: true"));
    }
}
