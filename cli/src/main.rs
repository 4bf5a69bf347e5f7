use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use fswatcher_cli::{Cli, FileConfig};
use fswatcher_core::{ConfigError, Error, ErrorCategory};
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

const EXIT_FAILURE: u8 = 1;
const EXIT_CONFIG: u8 = 2;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::default().add_directive(cli.log_level().into()));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e:#}");
            ExitCode::from(exit_code(&e))
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let file = match &cli.config {
        Some(path) => FileConfig::load(path)?,
        None => FileConfig::default(),
    };
    let config = cli.session_config(file)?;

    let shutdown = CancellationToken::new();
    let ctrl_c = shutdown.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("Received interrupt, stopping");
                ctrl_c.cancel();
            }
            Err(e) => error!("Failed to listen for interrupt: {e}"),
        }
    });

    let summary = fswatcher_core::watch(config, shutdown)
        .await
        .context("watch session")?;
    info!(
        "Watched {} directories, skipped {} busy ticks",
        summary.watched_directories, summary.skipped_ticks
    );
    Ok(())
}

fn exit_code(err: &anyhow::Error) -> u8 {
    if err.downcast_ref::<ConfigError>().is_some() {
        return EXIT_CONFIG;
    }
    match err.downcast_ref::<Error>().map(Error::category) {
        Some(ErrorCategory::Configuration) => EXIT_CONFIG,
        _ => EXIT_FAILURE,
    }
}
