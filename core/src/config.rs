//! Session configuration and startup validation.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use fswatcher_directory_watcher::IgnoreFilter;
use fswatcher_exec::{DEFAULT_SHELL, ShellCommand};
use path_absolutize::Absolutize;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::scheduler::TriggerMode;

/// Capacity of the channel between the OS primitive and the consumer.
pub const DEFAULT_EVENT_BUFFER: usize = 1000;

/// What to do when the user command fails.
///
/// One policy applies to the whole session, in both trigger modes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FailurePolicy {
    /// Log the failure and keep watching.
    #[default]
    Continue,

    /// End the session with an error.
    Abort,
}

impl FromStr for FailurePolicy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "continue" => Ok(Self::Continue),
            "abort" => Ok(Self::Abort),
            other => Err(ConfigError::InvalidPolicy(other.to_string())),
        }
    }
}

impl fmt::Display for FailurePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Continue => f.write_str("continue"),
            Self::Abort => f.write_str("abort"),
        }
    }
}

/// Parse a debounce interval.
///
/// Empty input and any zero duration select immediate mode (`None`).
/// Anything else must be a `humantime` duration such as `200ms` or `1m 30s`.
pub fn parse_interval(value: &str) -> Result<Option<Duration>, ConfigError> {
    let value = value.trim();
    if value.is_empty() || value == "0" {
        return Ok(None);
    }

    let duration =
        humantime::parse_duration(value).map_err(|e| ConfigError::InvalidInterval {
            value: value.to_string(),
            reason: e.to_string(),
        })?;

    Ok((!duration.is_zero()).then_some(duration))
}

/// Unvalidated configuration for one watch session.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// File or directory to watch.
    pub root: PathBuf,

    /// Shell command run on each trigger.
    pub command: String,

    /// Interpreter for the command.
    pub shell: String,

    /// Paths excluded from watching and triggering.
    pub ignores: Vec<PathBuf>,

    /// Whether subdirectories are watched.
    pub recursive: bool,

    /// Reserved; has no effect.
    pub notify: bool,

    /// Debounce window, `None` for immediate mode.
    pub interval: Option<Duration>,

    /// Command failure policy.
    pub on_failure: FailurePolicy,

    /// Capacity of the event channel.
    pub event_buffer: usize,
}

impl SessionConfig {
    /// Create a configuration with defaults for everything but the root.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            command: String::new(),
            shell: DEFAULT_SHELL.to_string(),
            ignores: Vec::new(),
            recursive: true,
            notify: false,
            interval: None,
            on_failure: FailurePolicy::default(),
            event_buffer: DEFAULT_EVENT_BUFFER,
        }
    }

    /// Set the command.
    pub fn with_command(mut self, command: impl Into<String>) -> Self {
        self.command = command.into();
        self
    }

    /// Set the shell.
    pub fn with_shell(mut self, shell: impl Into<String>) -> Self {
        self.shell = shell.into();
        self
    }

    /// Add an ignore entry.
    pub fn ignore(mut self, path: impl Into<PathBuf>) -> Self {
        self.ignores.push(path.into());
        self
    }

    /// Set whether subdirectories are watched.
    pub fn recursive(mut self, recursive: bool) -> Self {
        self.recursive = recursive;
        self
    }

    /// Set the debounce window. Zero selects immediate mode.
    pub fn with_interval(mut self, interval: Option<Duration>) -> Self {
        self.interval = interval;
        self
    }

    /// Set the failure policy.
    pub fn on_failure(mut self, policy: FailurePolicy) -> Self {
        self.on_failure = policy;
        self
    }

    /// Run every startup check and produce the configuration a session
    /// runs with.
    pub fn validate(self) -> Result<ValidatedConfig, ConfigError> {
        let root = absolute(&self.root)?;

        std::fs::metadata(&root).map_err(|source| {
            if source.kind() == std::io::ErrorKind::NotFound {
                ConfigError::RootNotFound(root.clone())
            } else {
                ConfigError::RootUnreadable {
                    path: root.clone(),
                    source,
                }
            }
        })?;

        let mut ignores = Vec::with_capacity(self.ignores.len());
        for item in &self.ignores {
            let item = absolute(item)?;
            if item == root {
                return Err(ConfigError::IgnoresRoot(item));
            }
            ignores.push(item);
        }

        Ok(ValidatedConfig {
            root,
            ignore: IgnoreFilter::new(ignores),
            mode: TriggerMode::from_interval(self.interval),
            command: ShellCommand::new(self.command).with_shell(self.shell),
            recursive: self.recursive,
            notify: self.notify,
            on_failure: self.on_failure,
            event_buffer: self.event_buffer.max(1),
        })
    }
}

/// Configuration that passed startup validation.
#[derive(Debug, Clone)]
pub struct ValidatedConfig {
    /// Absolute watch target.
    pub root: PathBuf,

    /// Absolute ignore entries; never contains `root`.
    pub ignore: IgnoreFilter,

    pub mode: TriggerMode,

    pub command: ShellCommand,

    pub recursive: bool,

    pub notify: bool,

    pub on_failure: FailurePolicy,

    pub event_buffer: usize,
}

fn absolute(path: &Path) -> Result<PathBuf, ConfigError> {
    path.absolutize()
        .map(|p| p.into_owned())
        .map_err(|source| ConfigError::Resolve {
            path: path.to_path_buf(),
            source,
        })
}
