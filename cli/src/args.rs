//! Command-line flags.

use std::path::PathBuf;

use clap::Parser;
use fswatcher_core::{ConfigError, FailurePolicy, SessionConfig, parse_interval};

use crate::config_file::FileConfig;

/// Watch a file or directory and run a command on every change.
///
/// With `--interval`, changes are coalesced and the command runs at most
/// once per interval. Ignore entries match exact paths only: ignoring a
/// directory does not ignore what is inside it.
#[derive(Parser, Debug)]
#[command(
    name = "fswatcher",
    version,
    about,
    long_about = None,
    after_help = "Example: fswatcher --command 'make test' --interval 500ms ./src"
)]
pub struct Cli {
    /// File or directory to watch.
    pub path: PathBuf,

    /// Command to execute when a change is detected.
    #[arg(short, long)]
    pub command: Option<String>,

    /// Comma-separated files and directories to ignore.
    #[arg(short, long, value_delimiter = ',')]
    pub ignore: Vec<PathBuf>,

    /// Watch subdirectories [default: true].
    #[arg(
        short,
        long,
        num_args = 0..=1,
        require_equals = true,
        default_missing_value = "true"
    )]
    pub recursive: Option<bool>,

    /// Reserved; currently has no effect.
    #[arg(
        short,
        long,
        num_args = 0..=1,
        require_equals = true,
        default_missing_value = "true"
    )]
    pub notify: Option<bool>,

    /// Run the command at most once per interval (e.g. `500ms`, `2s`).
    /// Empty or `0` runs it for every change.
    #[arg(short = 'v', long)]
    pub interval: Option<String>,

    /// Shell used to run the command.
    #[arg(long)]
    pub shell: Option<String>,

    /// What to do when the command fails: `continue` or `abort`.
    #[arg(long, value_name = "POLICY")]
    pub on_failure: Option<FailurePolicy>,

    /// Read defaults from a TOML file; flags given here take precedence.
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Only log warnings and errors.
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Log every registration and event.
    #[arg(long)]
    pub verbose: bool,
}

impl Cli {
    /// Default log directive when `RUST_LOG` is unset.
    pub fn log_level(&self) -> tracing::Level {
        if self.quiet {
            tracing::Level::WARN
        } else if self.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }

    /// Merge flags over `file` into a session configuration.
    pub fn session_config(&self, file: FileConfig) -> Result<SessionConfig, ConfigError> {
        let mut config = SessionConfig::new(&self.path);

        if let Some(command) = self.command.clone().or(file.command) {
            config = config.with_command(command);
        }
        if let Some(shell) = self.shell.clone().or(file.shell) {
            config = config.with_shell(shell);
        }

        config.ignores = if self.ignore.is_empty() {
            file.ignore.unwrap_or_default()
        } else {
            self.ignore.clone()
        };
        config.ignores.retain(|p| !p.as_os_str().is_empty());

        config = config.recursive(self.recursive.or(file.recursive).unwrap_or(true));
        config.notify = self.notify.or(file.notify).unwrap_or(false);

        let interval = self.interval.as_deref().or(file.interval.as_deref());
        config = config.with_interval(match interval {
            Some(value) => parse_interval(value)?,
            None => None,
        });

        if let Some(policy) = self.on_failure.or(file.on_failure) {
            config = config.on_failure(policy);
        }

        Ok(config)
    }
}
