//! Watch set management.
//!
//! [`WatchManager`] owns the set of directories registered with the OS
//! primitive. It is the only component that mutates the watch set, and it
//! consults the [`IgnoreFilter`] before registering anything.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use tracing::{debug, info};
use walkdir::WalkDir;

use crate::backend::WatchBackend;
use crate::error::{Result, WatcherError};
use crate::ignore::IgnoreFilter;

/// Grows the watch set as directories appear.
pub struct WatchManager<B: WatchBackend> {
    /// OS registration capability.
    backend: B,

    /// Paths excluded from registration.
    ignore: IgnoreFilter,

    /// Directories currently registered. Grows monotonically.
    watched: BTreeSet<PathBuf>,

    /// Whether subdirectories are watched.
    recursive: bool,
}

impl<B: WatchBackend> WatchManager<B> {
    /// Create a manager with an empty watch set.
    pub fn new(backend: B, ignore: IgnoreFilter, recursive: bool) -> Self {
        Self {
            backend,
            ignore,
            watched: BTreeSet::new(),
            recursive,
        }
    }

    /// Register `root` and, when recursive and `root` is a directory, every
    /// non-ignored directory beneath it.
    ///
    /// The root is registered last and is never checked against the ignore
    /// set; configuration validation rejects an ignored root. Returns the
    /// number of newly registered paths.
    pub fn initialize(&mut self, root: &Path) -> Result<usize> {
        let mut added = 0;
        if self.recursive && root.is_dir() {
            added += self.register_descendants(root)?;
        }
        if self.register(root)? {
            added += 1;
        }
        info!("Watching top entry: {}", root.display());
        Ok(added)
    }

    /// React to a directory-creation event.
    ///
    /// The new directory may already hold a populated subtree (a bulk copy
    /// or an archive extraction), so its existing descendants are enumerated
    /// exactly as [`initialize`](Self::initialize) does for the root. A
    /// directory that vanished before it could be listed is skipped.
    pub fn on_directory_created(&mut self, path: &Path) -> Result<usize> {
        if !self.recursive {
            return Ok(0);
        }

        match self.register_tree(path) {
            Err(e) if e.is_not_found() => {
                debug!("Created directory vanished before registration: {}", path.display());
                Ok(0)
            }
            other => other,
        }
    }

    /// Check whether a path is excluded by the ignore set.
    pub fn is_ignored(&self, path: &Path) -> bool {
        self.ignore.is_ignored(path)
    }

    pub fn is_watched(&self, path: &Path) -> bool {
        self.watched.contains(path)
    }

    /// Directories currently registered.
    pub fn watched(&self) -> impl Iterator<Item = &Path> {
        self.watched.iter().map(PathBuf::as_path)
    }

    pub fn watched_count(&self) -> usize {
        self.watched.len()
    }

    /// Release every OS watch handle.
    pub fn close(&mut self) {
        self.backend.close();
        info!("Stopped watching {} directories", self.watched.len());
    }

    /// Register `dir` itself (unless ignored) after its descendants.
    fn register_tree(&mut self, dir: &Path) -> Result<usize> {
        let mut added = self.register_descendants(dir)?;
        if !self.ignore.is_ignored(dir) && self.register(dir)? {
            added += 1;
        }
        Ok(added)
    }

    /// Register every non-ignored directory strictly below `dir`.
    ///
    /// Ignored directories are still descended into: ignoring does not
    /// cascade.
    fn register_descendants(&mut self, dir: &Path) -> Result<usize> {
        let mut added = 0;
        let walker = WalkDir::new(dir).min_depth(1).follow_links(false);

        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(source) => {
                    let vanished = source.depth() > 0
                        && source
                            .io_error()
                            .is_some_and(|e| e.kind() == std::io::ErrorKind::NotFound);
                    if vanished {
                        continue;
                    }
                    return Err(WatcherError::Enumerate {
                        path: source.path().unwrap_or(dir).to_path_buf(),
                        source,
                    });
                }
            };

            if !entry.file_type().is_dir() || self.ignore.is_ignored(entry.path()) {
                continue;
            }

            match self.register(entry.path()) {
                Ok(true) => added += 1,
                Ok(false) => {}
                Err(e) if e.is_not_found() => {
                    debug!("Directory vanished before registration: {}", entry.path().display());
                }
                Err(e) => return Err(e),
            }
        }

        Ok(added)
    }

    /// Register a single path. Already-watched paths are a no-op.
    fn register(&mut self, path: &Path) -> Result<bool> {
        if self.watched.contains(path) {
            return Ok(false);
        }

        self.backend.add(path)?;
        self.watched.insert(path.to_path_buf());
        debug!("Watching: {}", path.display());
        Ok(true)
    }
}
