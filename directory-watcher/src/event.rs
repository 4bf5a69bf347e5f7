//! File events delivered by the OS notification primitive.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A file system event for a single path.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FsEvent {
    /// The kind of event.
    pub kind: FsEventKind,

    /// Path to the affected file or directory.
    pub path: PathBuf,

    /// When the event was received.
    pub timestamp: DateTime<Utc>,
}

impl FsEvent {
    /// Create a new file event.
    pub fn new(kind: FsEventKind, path: impl Into<PathBuf>) -> Self {
        Self {
            kind,
            path: path.into(),
            timestamp: Utc::now(),
        }
    }

    /// Shorthand for a creation event.
    pub fn created(path: impl Into<PathBuf>) -> Self {
        Self::new(FsEventKind::Created, path)
    }

    /// Shorthand for a modification event.
    pub fn modified(path: impl Into<PathBuf>) -> Self {
        Self::new(FsEventKind::Modified, path)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether this event may trigger the user command.
    ///
    /// Pure access notifications never do, so a command that reads the
    /// watched tree cannot retrigger itself.
    pub fn is_change(&self) -> bool {
        self.kind != FsEventKind::Accessed
    }

    /// Whether this event reports a directory appearing at `path`, either
    /// created in place or moved in from elsewhere.
    ///
    /// The source side of a rename no longer exists and never matches.
    /// Symlinks are not followed: a link to a directory is reported as a
    /// plain change and nothing behind it is watched.
    pub fn is_directory_arrival(&self) -> bool {
        matches!(self.kind, FsEventKind::Created | FsEventKind::Renamed)
            && std::fs::symlink_metadata(&self.path).is_ok_and(|m| m.is_dir())
    }
}

/// Kind of file event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FsEventKind {
    /// File or directory was created.
    Created,

    /// File content was modified.
    Modified,

    /// File or directory was removed.
    Removed,

    /// File or directory was renamed (either side of the rename).
    Renamed,

    /// Permissions, ownership or timestamps changed.
    MetadataChanged,

    /// File was opened, read or closed. The write itself is reported as
    /// [`Modified`](Self::Modified), so close-after-write lands here too.
    Accessed,

    /// The backend could not classify the change.
    Other,
}

impl From<notify::EventKind> for FsEventKind {
    fn from(kind: notify::EventKind) -> Self {
        use notify::event::ModifyKind;

        match kind {
            notify::EventKind::Create(_) => Self::Created,
            notify::EventKind::Modify(ModifyKind::Name(_)) => Self::Renamed,
            notify::EventKind::Modify(ModifyKind::Metadata(_)) => Self::MetadataChanged,
            notify::EventKind::Modify(_) => Self::Modified,
            notify::EventKind::Remove(_) => Self::Removed,
            notify::EventKind::Access(_) => Self::Accessed,
            notify::EventKind::Any | notify::EventKind::Other => Self::Other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use notify::event::{AccessKind, AccessMode, CreateKind, ModifyKind, RenameMode};
    use pretty_assertions::assert_eq;

    #[test]
    fn test_event_creation() {
        let event = FsEvent::created("/tmp/foo/bar");
        assert_eq!(event.kind, FsEventKind::Created);
        assert_eq!(event.path(), Path::new("/tmp/foo/bar"));
    }

    #[test]
    fn test_kind_mapping() {
        assert_eq!(
            FsEventKind::from(notify::EventKind::Create(CreateKind::Folder)),
            FsEventKind::Created
        );
        assert_eq!(
            FsEventKind::from(notify::EventKind::Modify(ModifyKind::Name(RenameMode::To))),
            FsEventKind::Renamed
        );
        assert_eq!(
            FsEventKind::from(notify::EventKind::Access(AccessKind::Close(AccessMode::Write))),
            FsEventKind::Accessed
        );
        assert_eq!(
            FsEventKind::from(notify::EventKind::Access(AccessKind::Open(AccessMode::Read))),
            FsEventKind::Accessed
        );
    }

    #[test]
    fn test_access_is_not_a_change() {
        assert!(!FsEvent::new(FsEventKind::Accessed, "/tmp/a").is_change());
        assert!(FsEvent::modified("/tmp/a").is_change());
        assert!(FsEvent::new(FsEventKind::Removed, "/tmp/a").is_change());
    }

    #[test]
    fn test_directory_arrival_requires_existing_directory() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        assert!(FsEvent::created(temp_dir.path()).is_directory_arrival());
        assert!(!FsEvent::modified(temp_dir.path()).is_directory_arrival());
        assert!(!FsEvent::created(temp_dir.path().join("missing")).is_directory_arrival());

        let file = temp_dir.path().join("file.txt");
        std::fs::write(&file, "x").unwrap();
        assert!(!FsEvent::created(&file).is_directory_arrival());
    }

    #[test]
    fn test_directory_moved_in_is_an_arrival() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let moved = temp_dir.path().join("moved");
        std::fs::create_dir(&moved).unwrap();

        assert!(FsEvent::new(FsEventKind::Renamed, &moved).is_directory_arrival());
        assert!(
            !FsEvent::new(FsEventKind::Renamed, temp_dir.path().join("gone"))
                .is_directory_arrival()
        );
    }

    #[cfg(unix)]
    #[test]
    fn test_symlink_to_directory_is_not_an_arrival() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let target = temp_dir.path().join("target");
        let link = temp_dir.path().join("link");
        std::fs::create_dir(&target).unwrap();
        std::os::unix::fs::symlink(&target, &link).unwrap();

        assert!(!FsEvent::created(&link).is_directory_arrival());
        assert!(!FsEvent::new(FsEventKind::Renamed, &link).is_directory_arrival());
    }
}
