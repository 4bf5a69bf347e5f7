//! Error types for the directory watcher.

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias for watcher operations.
pub type Result<T> = std::result::Result<T, WatcherError>;

/// Errors that can occur while building or maintaining the watch set.
#[derive(Error, Debug)]
pub enum WatcherError {
    /// A directory could not be listed while enumerating a subtree.
    #[error("list subdirectories of {path}: {source}")]
    Enumerate {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },

    /// The OS primitive refused to register a path.
    #[error("watch {path}: {source}")]
    Register {
        path: PathBuf,
        #[source]
        source: notify::Error,
    },

    /// The OS primitive reported an error on its event stream.
    #[error("notify error: {0}")]
    Notify(#[from] notify::Error),

    /// The watch backend has already been closed.
    #[error("watch backend is closed")]
    Closed,

    /// IO error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl WatcherError {
    /// Whether the error means the path vanished before it could be handled.
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::Enumerate { source, .. } => source
                .io_error()
                .is_some_and(|e| e.kind() == std::io::ErrorKind::NotFound),
            Self::Register { source, .. } | Self::Notify(source) => {
                matches!(&source.kind, notify::ErrorKind::PathNotFound)
                    || matches!(&source.kind, notify::ErrorKind::Io(e) if e.kind() == std::io::ErrorKind::NotFound)
            }
            Self::Io(e) => e.kind() == std::io::ErrorKind::NotFound,
            Self::Closed => false,
        }
    }
}
