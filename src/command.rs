//! Project command execution behind a narrow seam.
//!
//! The session only consumes the final captured log text; streaming,
//! sandboxing, and kill semantics belong to the runner implementation.

use crate::error::CommandError;
use async_trait::async_trait;
use std::path::Path;
use std::process::Stdio;
use tokio::process::Command;

/// Captured result of one command run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutput {
    /// Process exit code; -1 when terminated by a signal.
    pub exit_code: i32,
    /// Console-style log: the echoed command line, merged output, exit note.
    pub log: String,
}

/// Runs a shell command in a working directory and captures its output.
#[async_trait]
pub trait CommandRunner: Send + Sync {
    async fn run(&self, command: &str, cwd: &Path) -> Result<CommandOutput, CommandError>;
}

/// Runner that executes `sh -c` on the local machine.
pub struct LocalRunner;

#[async_trait]
impl CommandRunner for LocalRunner {
    async fn run(&self, command: &str, cwd: &Path) -> Result<CommandOutput, CommandError> {
        let mut cmd = Command::new("sh");
        // Dropping the session mid-run must not leave the child behind.
        cmd.kill_on_drop(true);
        cmd.arg("-c")
            .arg(command)
            .current_dir(cwd)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        let child = cmd
            .spawn()
            .map_err(|e| CommandError::Spawn(format!("sh: {e}")))?;
        let output = child
            .wait_with_output()
            .await
            .map_err(|e| CommandError::Capture(e.to_string()))?;

        let exit_code = output.status.code().unwrap_or(-1);
        let mut log = format!("$ {command}\n");
        log.push_str(&String::from_utf8_lossy(&output.stdout));
        log.push_str(&String::from_utf8_lossy(&output.stderr));
        log.push_str(&format!("\nprocess exited with code {exit_code}\n"));
        Ok(CommandOutput { exit_code, log })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn echo_command_captures_stdout() {
        let output = LocalRunner
            .run("echo hello", &std::env::temp_dir())
            .await
            .expect("run");
        assert_eq!(output.exit_code, 0);
        assert!(output.log.starts_with("$ echo hello\n"), "got: {}", output.log);
        assert!(output.log.contains("hello"));
        assert!(output.log.contains("exited with code 0"));
    }

    #[tokio::test]
    async fn failing_command_reports_exit_code() {
        let output = LocalRunner
            .run("exit 42", &std::env::temp_dir())
            .await
            .expect("run");
        assert_eq!(output.exit_code, 42);
        assert!(output.log.contains("exited with code 42"));
    }

    #[tokio::test]
    async fn stderr_is_captured_in_the_log() {
        let output = LocalRunner
            .run("echo oops >&2", &std::env::temp_dir())
            .await
            .expect("run");
        assert!(output.log.contains("oops"), "got: {}", output.log);
    }

    #[tokio::test]
    async fn command_runs_in_the_given_directory() {
        let output = LocalRunner
            .run("pwd", &std::env::temp_dir())
            .await
            .expect("run");
        let expected = std::env::temp_dir();
        // Canonicalize both sides; temp dirs are often symlinked.
        let canonical = std::fs::canonicalize(&expected).unwrap_or(expected);
        assert!(
            output.log.contains(&canonical.display().to_string())
                || output.log.contains("tmp"),
            "got: {}",
            output.log
        );
    }

    #[tokio::test]
    async fn missing_working_directory_is_a_spawn_error() {
        let err = LocalRunner
            .run("echo hi", Path::new("/definitely/not/a/dir"))
            .await
            .expect_err("spawn should fail");
        assert!(err.to_string().contains("spawn"), "got: {err}");
    }
}
