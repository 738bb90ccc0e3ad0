//! Shell command execution behind an injectable [`Executor`].
use anyhow::{Context, Result};
use std::path::Path;
use std::process::{Command, ExitStatus};

/// Result of a command execution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecResult {
    /// Whether the process exited successfully.
    pub success: bool,
    /// Exit code, or `None` if the process was killed by a signal.
    pub code: Option<i32>,
}

impl From<ExitStatus> for ExecResult {
    fn from(status: ExitStatus) -> Self {
        Self {
            success: status.success(),
            code: status.code(),
        }
    }
}

impl ExecResult {
    /// Human-readable exit description, e.g. `exit 2` or `killed by signal`.
    #[must_use]
    pub fn describe(&self) -> String {
        self.code
            .map_or_else(|| "killed by signal".to_string(), |code| format!("exit {code}"))
    }
}

/// Runs shell command lines and script files. Swapped for a mock in tests.
#[cfg_attr(test, mockall::automock)]
pub trait Executor: Send + Sync {
    /// Run `command` through the shell in `dir`, inheriting stdio, and wait
    /// for it to finish.
    ///
    /// A non-zero exit is reported through [`ExecResult::success`], not as an
    /// error.
    ///
    /// # Errors
    ///
    /// Returns an error if the shell cannot be spawned.
    fn run_shell(&self, command: &str, dir: &Path) -> Result<ExecResult>;

    /// Execute the file at `program` directly in `dir`, with no shell
    /// word splitting of its path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be spawned.
    fn run_program(&self, program: &Path, dir: &Path) -> Result<ExecResult>;
}

/// Production [`Executor`] that spawns `sh -c` (`cmd /C` on Windows).
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemExecutor;

impl Executor for SystemExecutor {
    fn run_shell(&self, command: &str, dir: &Path) -> Result<ExecResult> {
        #[cfg(windows)]
        let mut cmd = {
            let mut cmd = Command::new("cmd");
            cmd.arg("/C").arg(command);
            cmd
        };
        #[cfg(not(windows))]
        let mut cmd = {
            let mut cmd = Command::new("sh");
            cmd.arg("-c").arg(command);
            cmd
        };

        let status = cmd
            .current_dir(dir)
            .status()
            .with_context(|| format!("failed to execute: {command}"))?;
        Ok(ExecResult::from(status))
    }

    fn run_program(&self, program: &Path, dir: &Path) -> Result<ExecResult> {
        let status = Command::new(program)
            .current_dir(dir)
            .status()
            .with_context(|| format!("failed to execute: {}", program.display()))?;
        Ok(ExecResult::from(status))
    }
}

#[cfg(all(test, unix))]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn run_true() {
        let result = SystemExecutor
            .run_shell("true", &std::env::temp_dir())
            .unwrap();
        assert!(result.success);
        assert_eq!(result.code, Some(0));
    }

    #[test]
    fn non_zero_exit_is_not_an_error() {
        let result = SystemExecutor
            .run_shell("exit 3", &std::env::temp_dir())
            .unwrap();
        assert!(!result.success);
        assert_eq!(result.describe(), "exit 3");
    }

    #[test]
    fn runs_in_requested_directory() {
        let dir = tempfile::tempdir().unwrap();
        let result = SystemExecutor
            .run_shell("touch marker", dir.path())
            .unwrap();
        assert!(result.success);
        assert!(dir.path().join("marker").exists());
    }

    #[test]
    fn missing_directory_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = SystemExecutor.run_shell("true", &dir.path().join("absent"));
        assert!(result.is_err());
    }

    #[test]
    fn program_path_with_spaces_runs_as_one_argument() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let work = dir.path().join("my conf");
        std::fs::create_dir_all(&work).unwrap();
        let script = work.join("set up.sh");
        std::fs::write(&script, "#!/bin/sh\ntouch ran\n").unwrap();
        std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).unwrap();

        let result = SystemExecutor.run_program(&script, &work).unwrap();
        assert!(result.success, "{}", result.describe());
        assert!(work.join("ran").exists());
    }

    #[test]
    fn missing_program_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = SystemExecutor.run_program(&dir.path().join("absent.sh"), dir.path());
        assert!(result.is_err());
    }
}
