//! # fswatcher core
//!
//! Watches a file-system subtree and runs a shell command when it changes,
//! either once per change or at most once per debounce window.
//!
//! ```text
//! OS events ──► WatchManager ──► Scheduler ──► CommandRunner
//!   (notify)     (recursion,      (immediate     (shell, captured
//!                 ignores)         or windowed)    output)
//! ```

pub mod config;
pub mod debounce;
pub mod error;
pub mod output;
pub mod scheduler;
pub mod session;
pub mod summary;

pub use config::{FailurePolicy, SessionConfig, ValidatedConfig, parse_interval};
pub use debounce::{DebounceState, ExecutionPermit};
pub use error::{ConfigError, Error, ErrorCategory, Result};
pub use output::{OutputSink, StdStreams};
pub use scheduler::{Scheduler, TickOutcome, Trigger, TriggerMode};
pub use session::Session;
pub use summary::{SessionStats, SessionSummary};

use fswatcher_directory_watcher::NotifyBackend;
use fswatcher_exec::ShellExecutor;
use tokio_util::sync::CancellationToken;

/// Validate `config`, watch its root with the platform notifier and run
/// the command on changes until `shutdown` fires.
pub async fn watch(config: SessionConfig, shutdown: CancellationToken) -> Result<SessionSummary> {
    let config = config.validate()?;
    let (backend, events) = NotifyBackend::new(config.event_buffer)?;
    let runner = ShellExecutor::new(config.command.clone());

    let mut session = Session::new(config, backend, events, runner);
    session.initialize()?;
    session.run(shutdown).await
}
