//! The watch session: one consumer loop over the OS event stream.
//!
//! The loop is the single place where errors meet policy. Registration
//! and event-source errors end the session; command failures go through
//! the configured [`FailurePolicy`]. Every way out of [`Session::run`]
//! stops the ticker and releases the OS watch handles.

use std::path::PathBuf;
use std::sync::Arc;

use fswatcher_directory_watcher::{EventReceiver, FsEvent, FsEventKind, WatchBackend, WatchManager};
use fswatcher_exec::{CommandRunner, ExecError};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::config::{FailurePolicy, ValidatedConfig};
use crate::error::{Error, Result};
use crate::output::{OutputSink, StdStreams};
use crate::scheduler::{ExecutionReport, Scheduler, Trigger, TriggerMode};
use crate::summary::{SessionStats, SessionSummary};

/// A configured watch session, ready to run.
pub struct Session<B: WatchBackend, R> {
    root: PathBuf,
    manager: WatchManager<B>,
    events: EventReceiver,
    scheduler: Arc<Scheduler<R>>,
    on_failure: FailurePolicy,
    stats: Arc<SessionStats>,
    output: Box<dyn OutputSink>,
    /// Path of the last qualifying `Created` event, until the next
    /// qualifying event arrives.
    last_created: Option<PathBuf>,
}

impl<B: WatchBackend, R: CommandRunner + 'static> Session<B, R> {
    /// Assemble a session from its collaborators. Nothing is registered
    /// until [`initialize`](Self::initialize).
    pub fn new(config: ValidatedConfig, backend: B, events: EventReceiver, runner: R) -> Self {
        let stats = Arc::new(SessionStats::default());

        if config.command.is_empty() {
            warn!("No command configured; changes will run an empty shell command");
        }
        if config.notify {
            debug!("--notify is reserved and has no effect");
        }
        if !config.ignore.is_empty() {
            info!("Ignoring {} paths", config.ignore.len());
        }

        Self {
            root: config.root,
            manager: WatchManager::new(backend, config.ignore, config.recursive),
            events,
            scheduler: Arc::new(Scheduler::new(config.mode, runner, Arc::clone(&stats))),
            on_failure: config.on_failure,
            stats,
            output: Box::new(StdStreams),
            last_created: None,
        }
    }

    /// Send command output to `sink` instead of the process's streams.
    pub fn with_output(mut self, sink: impl OutputSink + 'static) -> Self {
        self.output = Box::new(sink);
        self
    }

    /// Build the initial watch set. On failure the handles registered so
    /// far are released before the error is returned.
    pub fn initialize(&mut self) -> Result<usize> {
        match self.manager.initialize(&self.root) {
            Ok(added) => Ok(added),
            Err(e) => {
                self.manager.close();
                Err(e.into())
            }
        }
    }

    pub fn manager(&self) -> &WatchManager<B> {
        &self.manager
    }

    /// Consume events until `shutdown` fires, the event source closes, or a
    /// fatal error occurs.
    pub async fn run(mut self, shutdown: CancellationToken) -> Result<SessionSummary> {
        let cancel = shutdown.child_token();
        let (reports_tx, mut reports_rx) = mpsc::unbounded_channel();

        let ticker = match self.scheduler.mode() {
            TriggerMode::Windowed(window) => {
                info!("Executing at most once every {window:?}");
                Some(
                    self.scheduler
                        .spawn_ticker(window, reports_tx.clone(), cancel.clone()),
                )
            }
            TriggerMode::Immediate => None,
        };

        let result = self.consume(&cancel, &mut reports_rx).await;
        if let Err(e) = &result {
            error!("Watch session failed: {e}");
        }

        cancel.cancel();
        if let Some(ticker) = ticker {
            if let Err(e) = ticker.await {
                warn!("Ticker task ended abnormally: {e}");
            }
        }
        self.manager.close();

        let summary = self.stats.summary(self.manager.watched_count());
        info!(
            "Session ended: {} events ({} ignored), {} executions, {} failures",
            summary.events_seen, summary.events_ignored, summary.executions, summary.failures
        );
        result.map(|()| summary)
    }

    async fn consume(
        &mut self,
        cancel: &CancellationToken,
        reports: &mut mpsc::UnboundedReceiver<ExecutionReport>,
    ) -> Result<()> {
        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    info!("Shutdown requested");
                    return Ok(());
                }
                Some(report) = reports.recv() => self.handle_report(report)?,
                event = self.events.recv() => match event {
                    None => {
                        info!("Event source closed, shutting down");
                        return Ok(());
                    }
                    Some(Err(e)) => return Err(e.into()),
                    Some(Ok(event)) => self.handle_event(event, cancel).await?,
                },
            }
        }
    }

    async fn handle_event(&mut self, event: FsEvent, cancel: &CancellationToken) -> Result<()> {
        self.stats.record_event();
        debug!("{:?}: {}", event.kind, event.path.display());

        // The new directory joins the watch set before the next event is read.
        if event.is_directory_arrival() {
            let added = self.manager.on_directory_created(&event.path)?;
            if added > 0 {
                info!("Watching {added} new directories under {}", event.path.display());
            }
        }

        if !event.is_change() || self.manager.is_ignored(&event.path) {
            self.stats.record_ignored();
            return Ok(());
        }

        // Creating a file and writing its first contents is one change, even
        // though the OS reports the write separately.
        let created = self.last_created.take();
        if event.kind == FsEventKind::Modified && created.as_ref() == Some(&event.path) {
            debug!("Folding first write into creation of {}", event.path.display());
            self.stats.record_ignored();
            return Ok(());
        }
        if event.kind == FsEventKind::Created {
            self.last_created = Some(event.path.clone());
        }

        match self.scheduler.on_event() {
            Trigger::Deferred => Ok(()),
            Trigger::Execute => {
                let report = self.scheduler.execute_now(cancel).await;
                self.handle_report(report)
            }
        }
    }

    fn handle_report(&self, report: ExecutionReport) -> Result<()> {
        match report {
            Ok(result) if result.success => {
                self.stats.record_execution();
                if let Err(e) = self.output.emit(&result) {
                    warn!("Failed to write command output: {e}");
                }
                Ok(())
            }
            Ok(result) => {
                self.stats.record_execution();
                self.stats.record_failure();
                if let Err(e) = self.output.emit(&result) {
                    warn!("Failed to write command output: {e}");
                }
                self.apply_policy(Error::CommandFailed {
                    status: result.status(),
                })
            }
            Err(ExecError::Cancelled) => Ok(()),
            Err(e) => {
                self.stats.record_failure();
                self.apply_policy(e.into())
            }
        }
    }

    fn apply_policy(&self, err: Error) -> Result<()> {
        match self.on_failure {
            FailurePolicy::Continue => {
                warn!("{err}; continuing to watch");
                Ok(())
            }
            FailurePolicy::Abort => Err(err),
        }
    }
}
