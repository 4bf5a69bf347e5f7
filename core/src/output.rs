//! Emits a finished execution's captured output.
//!
//! Output is written only after the command has exited, stdout first, so
//! every execution appears as one contiguous block.

use std::io::{self, Write};

use fswatcher_exec::ExecutionResult;
use tracing::info;

/// Write captured stdout to `out` and captured stderr to `err`.
pub fn write_output(
    result: &ExecutionResult,
    out: &mut impl Write,
    err: &mut impl Write,
) -> io::Result<()> {
    out.write_all(result.stdout.as_bytes())?;
    out.flush()?;
    err.write_all(result.stderr.as_bytes())?;
    err.flush()
}

/// Emit an execution's output on the process's own streams.
pub fn emit(result: &ExecutionResult) -> io::Result<()> {
    info!("======== execute user command, output begin: ========");
    write_output(result, &mut io::stdout().lock(), &mut io::stderr().lock())?;
    info!("======== execute user command, output end:   ========");
    Ok(())
}

/// Destination for finished executions' output, successful or not.
pub trait OutputSink: Send + Sync {
    fn emit(&self, result: &ExecutionResult) -> io::Result<()>;
}

/// Writes to the process's stdout and stderr.
#[derive(Debug, Default, Clone, Copy)]
pub struct StdStreams;

impl OutputSink for StdStreams {
    fn emit(&self, result: &ExecutionResult) -> io::Result<()> {
        emit(result)
    }
}
