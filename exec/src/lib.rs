//! # Exec
//!
//! Runs the user's shell command and captures its output streams into
//! separate buffers, so each execution is reported as one atomic unit.

pub mod error;
pub mod executor;

pub use error::{ExecError, Result};
pub use executor::{CommandRunner, ExecutionResult, ShellCommand, ShellExecutor};

/// Shell used when none is configured.
pub const DEFAULT_SHELL: &str = "bash";
