//! Command-line front end for fswatcher.

pub mod args;
pub mod config_file;

pub use args::Cli;
pub use config_file::FileConfig;
