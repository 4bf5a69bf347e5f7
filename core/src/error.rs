//! Error types for the watch session.

use std::path::PathBuf;

use fswatcher_directory_watcher::WatcherError;
use fswatcher_exec::ExecError;
use thiserror::Error;

/// Result type alias for session operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Startup configuration errors. All of them are detected before any
/// watching begins.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// A path could not be made absolute.
    #[error("get the absolute path of {path}: {source}")]
    Resolve {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The watch target does not exist.
    #[error("the watching file or path does not exist: {0}")]
    RootNotFound(PathBuf),

    /// The watch target exists but cannot be inspected.
    #[error("the watching file or path {path}: {source}")]
    RootUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// An ignore entry names the watch target itself.
    #[error("ignoring the watching file or directory is invalid: {0}")]
    IgnoresRoot(PathBuf),

    /// The debounce interval could not be parsed.
    #[error("invalid interval {value:?}: {reason}")]
    InvalidInterval { value: String, reason: String },

    /// The configuration file could not be read or parsed.
    #[error("config file {path}: {reason}")]
    File { path: PathBuf, reason: String },

    /// A failure policy name was not recognised.
    #[error("invalid failure policy {0:?}, expected `continue` or `abort`")]
    InvalidPolicy(String),
}

/// Errors that end a watch session.
#[derive(Error, Debug)]
pub enum Error {
    /// Invalid configuration.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Directory listing, registration or event-source failure.
    #[error(transparent)]
    Watch(#[from] WatcherError),

    /// The command could not be run.
    #[error("execute user command: {0}")]
    Exec(#[from] ExecError),

    /// The command ran and reported failure.
    #[error("user command {status}")]
    CommandFailed { status: String },
}

/// Error taxonomy used to pick exit codes and policies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Detected at startup, before watching.
    Configuration,
    /// Watch set could not be maintained.
    Registration,
    /// The user command failed.
    Command,
    /// The OS notification stream reported an error.
    EventSource,
}

impl Error {
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Config(_) => ErrorCategory::Configuration,
            Self::Watch(WatcherError::Notify(_)) => ErrorCategory::EventSource,
            Self::Watch(_) => ErrorCategory::Registration,
            Self::Exec(_) | Self::CommandFailed { .. } => ErrorCategory::Command,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_categories() {
        let config = Error::from(ConfigError::IgnoresRoot(PathBuf::from("/tmp/foo")));
        assert_eq!(config.category(), ErrorCategory::Configuration);

        let watch = Error::from(WatcherError::Closed);
        assert_eq!(watch.category(), ErrorCategory::Registration);

        let stream = Error::from(WatcherError::Notify(notify::Error::generic("overflow")));
        assert_eq!(stream.category(), ErrorCategory::EventSource);

        let failed = Error::CommandFailed {
            status: "exited with status 1".to_string(),
        };
        assert_eq!(failed.category(), ErrorCategory::Command);
        assert_eq!(failed.to_string(), "user command exited with status 1");
    }
}
