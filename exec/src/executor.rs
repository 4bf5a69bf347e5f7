//! Command execution engine.
//!
//! The [`ShellExecutor`] launches `<shell> -c <command>`, waits for it to
//! exit and hands back both output streams. Nothing is streamed while the
//! command runs.

use std::process::Stdio;
use std::time::Instant;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::process::Command;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::DEFAULT_SHELL;
use crate::error::{ExecError, Result};

/// An opaque shell invocation, immutable once built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShellCommand {
    /// Interpreter receiving the command through `-c`.
    pub shell: String,

    /// The command string.
    pub command: String,
}

impl ShellCommand {
    /// Create a command run by the default shell.
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            shell: DEFAULT_SHELL.to_string(),
            command: command.into(),
        }
    }

    /// Set the interpreter.
    pub fn with_shell(mut self, shell: impl Into<String>) -> Self {
        self.shell = shell.into();
        self
    }

    pub fn is_empty(&self) -> bool {
        self.command.trim().is_empty()
    }
}

/// Result of one command execution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionResult {
    /// Whether the command exited with status zero.
    pub success: bool,

    /// Exit code, `None` when terminated by a signal.
    pub exit_code: Option<i32>,

    /// Captured standard output.
    pub stdout: String,

    /// Captured standard error.
    pub stderr: String,

    /// When the process was started.
    pub started_at: DateTime<Utc>,

    /// Execution time in milliseconds.
    pub duration_ms: u64,
}

impl ExecutionResult {
    /// Short human description of the outcome.
    pub fn status(&self) -> String {
        match (self.success, self.exit_code) {
            (true, _) => "succeeded".to_string(),
            (false, Some(code)) => format!("exited with status {code}"),
            (false, None) => "terminated by signal".to_string(),
        }
    }
}

/// Capability to run the configured command once.
///
/// Implementations must honour `cancel`: when it fires, the command is
/// stopped and [`ExecError::Cancelled`] is returned.
#[async_trait]
pub trait CommandRunner: Send + Sync {
    async fn run(&self, cancel: &CancellationToken) -> Result<ExecutionResult>;
}

/// Executor running a [`ShellCommand`] as a child process.
pub struct ShellExecutor {
    command: ShellCommand,
}

impl ShellExecutor {
    pub fn new(command: ShellCommand) -> Self {
        Self { command }
    }
}

#[async_trait]
impl CommandRunner for ShellExecutor {
    async fn run(&self, cancel: &CancellationToken) -> Result<ExecutionResult> {
        let ShellCommand { shell, command } = &self.command;
        debug!("Executing: {shell} -c {command:?}");

        let started_at = Utc::now();
        let start = Instant::now();

        let child = Command::new(shell)
            .arg("-c")
            .arg(command)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| ExecError::Spawn {
                shell: shell.clone(),
                command: command.clone(),
                source,
            })?;

        // Dropping the wait future drops the child, which kills it.
        let output = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                warn!("Command cancelled by shutdown: {command}");
                return Err(ExecError::Cancelled);
            }
            output = child.wait_with_output() => output?,
        };

        let duration_ms = start.elapsed().as_millis() as u64;
        let result = ExecutionResult {
            success: output.status.success(),
            exit_code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            started_at,
            duration_ms,
        };

        info!("Command {} in {}ms", result.status(), duration_ms);
        Ok(result)
    }
}
