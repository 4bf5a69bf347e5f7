//! OS change-notification backends.
//!
//! A backend registers individual paths and releases every registration on
//! [`WatchBackend::close`]. Events flow separately, through the channel
//! returned when the backend is created.

use std::path::{Path, PathBuf};

use notify::{RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;
use tracing::{debug, error};

use crate::error::{Result, WatcherError};
use crate::event::{FsEvent, FsEventKind};

/// Receiving half of a backend's event stream.
pub type EventReceiver = mpsc::Receiver<Result<FsEvent>>;

/// Capability to register paths with the OS notification primitive.
pub trait WatchBackend: Send {
    /// Register a single path, non-recursively.
    fn add(&mut self, path: &Path) -> Result<()>;

    /// Release every registration. Calling `close` twice is a no-op.
    fn close(&mut self);
}

/// Backend built on the platform's recommended `notify` watcher.
pub struct NotifyBackend {
    /// `None` once closed.
    watcher: Option<RecommendedWatcher>,

    /// Paths registered so far, released on close.
    registered: Vec<PathBuf>,
}

impl NotifyBackend {
    /// Create a backend whose events are delivered through a bounded
    /// channel of `capacity` entries.
    ///
    /// The notify thread blocks when the channel is full, so a slow consumer
    /// pushes back on the OS primitive rather than buffering without bound.
    pub fn new(capacity: usize) -> Result<(Self, EventReceiver)> {
        let (event_tx, event_rx) = mpsc::channel(capacity.max(1));

        let watcher = notify::recommended_watcher(
            move |res: std::result::Result<notify::Event, notify::Error>| match res {
                Ok(event) => {
                    let kind = FsEventKind::from(event.kind);
                    for path in event.paths {
                        if event_tx.blocking_send(Ok(FsEvent::new(kind, path))).is_err() {
                            debug!("Event receiver dropped, discarding event");
                            return;
                        }
                    }
                }
                Err(e) => {
                    error!("Watch error: {e}");
                    let _ = event_tx.blocking_send(Err(WatcherError::Notify(e)));
                }
            },
        )?;

        Ok((
            Self {
                watcher: Some(watcher),
                registered: Vec::new(),
            },
            event_rx,
        ))
    }
}

impl WatchBackend for NotifyBackend {
    fn add(&mut self, path: &Path) -> Result<()> {
        let watcher = self.watcher.as_mut().ok_or(WatcherError::Closed)?;
        watcher
            .watch(path, RecursiveMode::NonRecursive)
            .map_err(|source| WatcherError::Register {
                path: path.to_path_buf(),
                source,
            })?;
        self.registered.push(path.to_path_buf());
        Ok(())
    }

    fn close(&mut self) {
        if let Some(mut watcher) = self.watcher.take() {
            for path in self.registered.drain(..) {
                // Deleted directories are already unwatched by the kernel.
                let _ = watcher.unwatch(&path);
            }
            debug!("Released all watch handles");
        }
    }
}

impl Drop for NotifyBackend {
    fn drop(&mut self) {
        self.close();
    }
}
