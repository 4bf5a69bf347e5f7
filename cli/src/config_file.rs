//! Optional TOML configuration file.
//!
//! ```toml
//! command = "cargo test"
//! ignore = ["target", "notes.md"]
//! interval = "500ms"
//! on_failure = "continue"
//! ```
//!
//! Relative ignore entries are resolved against the working directory,
//! like the ones given on the command line.

use std::path::{Path, PathBuf};

use fswatcher_core::{ConfigError, FailurePolicy};
use serde::Deserialize;

/// Settings read from a config file. Every key is optional.
#[derive(Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    pub command: Option<String>,
    pub shell: Option<String>,
    pub ignore: Option<Vec<PathBuf>>,
    pub recursive: Option<bool>,
    pub notify: Option<bool>,
    pub interval: Option<String>,
    pub on_failure: Option<FailurePolicy>,
}

impl FileConfig {
    /// Load and parse `path`.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::File {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        toml::from_str(&contents).map_err(|e| ConfigError::File {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }
}
