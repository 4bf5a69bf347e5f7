//! Error types for command execution.

use thiserror::Error;

/// Result type alias for execution operations.
pub type Result<T> = std::result::Result<T, ExecError>;

/// Errors that prevent a command from producing an exit status.
#[derive(Error, Debug)]
pub enum ExecError {
    /// The shell process could not be started.
    #[error("failed to start `{shell} -c {command}`: {source}")]
    Spawn {
        shell: String,
        command: String,
        #[source]
        source: std::io::Error,
    },

    /// Waiting for the process or reading its output failed.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Execution was cancelled by shutdown; the child was killed.
    #[error("execution cancelled")]
    Cancelled,
}
