//! Exact-match ignore filtering.
//!
//! The filter holds absolute paths and answers membership questions only.
//! It does not cascade: ignoring `/tmp/foo/build` leaves
//! `/tmp/foo/build/cache` watched and triggering unless that path is
//! listed as well.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

/// Set of absolute paths excluded from watching and from triggering.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IgnoreFilter {
    paths: BTreeSet<PathBuf>,
}

impl IgnoreFilter {
    /// Create a filter from already-absolute paths.
    pub fn new<I, P>(paths: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        Self {
            paths: paths.into_iter().map(Into::into).collect(),
        }
    }

    /// Check whether `path` is listed verbatim.
    pub fn is_ignored(&self, path: &Path) -> bool {
        self.paths.contains(path)
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_exact_match() {
        let filter = IgnoreFilter::new(["/tmp/foo/build", "/tmp/foo/notes.txt"]);

        assert!(filter.is_ignored(Path::new("/tmp/foo/build")));
        assert!(filter.is_ignored(Path::new("/tmp/foo/notes.txt")));
        assert!(!filter.is_ignored(Path::new("/tmp/foo")));
        assert!(!filter.is_ignored(Path::new("/tmp/foo/buil")));
        assert_eq!(filter.len(), 2);
    }

    #[test]
    fn test_does_not_cascade_to_descendants() {
        let filter = IgnoreFilter::new(["/tmp/foo/build"]);
        assert!(!filter.is_ignored(Path::new("/tmp/foo/build/cache")));
    }

    #[test]
    fn test_empty_filter_ignores_nothing() {
        let filter = IgnoreFilter::default();
        assert!(filter.is_empty());
        assert!(!filter.is_ignored(Path::new("/")));
    }
}
