//! Turns the event stream into command executions.
//!
//! In immediate mode every qualifying event runs the command once, inline
//! with event consumption. In windowed mode events only mark the shared
//! [`DebounceState`] pending; a ticker firing once per window runs the
//! command at most once per tick and never while a previous run is still
//! going.

use std::sync::Arc;
use std::time::Duration;

use fswatcher_exec::{CommandRunner, ExecutionResult};
use tokio::sync::mpsc;
use tokio::task::{JoinHandle, JoinSet};
use tokio::time::{self, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::debounce::DebounceState;
use crate::summary::SessionStats;

/// Outcome of one execution, delivered to the session loop.
pub type ExecutionReport = fswatcher_exec::Result<ExecutionResult>;

/// How events are converted into executions. Fixed at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerMode {
    /// One execution per qualifying event.
    Immediate,

    /// At most one execution per window.
    Windowed(Duration),
}

impl TriggerMode {
    /// `None` or a zero window selects immediate mode.
    pub fn from_interval(interval: Option<Duration>) -> Self {
        match interval {
            Some(window) if !window.is_zero() => Self::Windowed(window),
            _ => Self::Immediate,
        }
    }

    pub fn window(&self) -> Option<Duration> {
        match self {
            Self::Immediate => None,
            Self::Windowed(window) => Some(*window),
        }
    }
}

/// What the consumer should do with a qualifying event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    /// Run the command now, before consuming the next event.
    Execute,

    /// The next tick takes care of it.
    Deferred,
}

/// Result of one windowed-mode tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Nothing happened since the last execution.
    Idle,

    /// Changes are pending but the previous execution is still running.
    Busy,

    /// An execution was started and the pending flag cleared.
    Scheduled,
}

/// Event aggregator and debounce scheduler.
pub struct Scheduler<R> {
    mode: TriggerMode,
    state: Arc<DebounceState>,
    runner: Arc<R>,
    stats: Arc<SessionStats>,
}

impl<R: CommandRunner + 'static> Scheduler<R> {
    pub fn new(mode: TriggerMode, runner: R, stats: Arc<SessionStats>) -> Self {
        Self {
            mode,
            state: DebounceState::new(),
            runner: Arc::new(runner),
            stats,
        }
    }

    pub fn mode(&self) -> TriggerMode {
        self.mode
    }

    pub fn state(&self) -> &Arc<DebounceState> {
        &self.state
    }

    /// Record a qualifying event.
    pub fn on_event(&self) -> Trigger {
        match self.mode {
            TriggerMode::Immediate => Trigger::Execute,
            TriggerMode::Windowed(_) => {
                self.state.mark_pending();
                Trigger::Deferred
            }
        }
    }

    /// Run the command inline. Used by immediate mode, where the consumer
    /// blocks on the execution and so never overlaps two of them.
    pub async fn execute_now(&self, cancel: &CancellationToken) -> ExecutionReport {
        self.runner.run(cancel).await
    }

    /// Handle one windowed-mode tick.
    ///
    /// A busy tick leaves the pending flag set so the change is picked up
    /// by the first tick after the running execution finishes.
    pub fn tick(
        &self,
        tasks: &mut JoinSet<()>,
        reports: &mpsc::UnboundedSender<ExecutionReport>,
        cancel: &CancellationToken,
    ) -> TickOutcome {
        if !self.state.is_pending() {
            return TickOutcome::Idle;
        }

        let Some(permit) = self.state.try_begin() else {
            return TickOutcome::Busy;
        };

        if !self.state.take_pending() {
            return TickOutcome::Idle;
        }

        let runner = Arc::clone(&self.runner);
        let reports = reports.clone();
        let cancel = cancel.clone();
        tasks.spawn(async move {
            let report = runner.run(&cancel).await;
            let _ = reports.send(report);
            drop(permit);
        });

        TickOutcome::Scheduled
    }

    /// Start the windowed-mode ticker. The first tick fires one full window
    /// after startup; missed ticks are skipped, not bursted.
    ///
    /// The task stops when `cancel` fires, after waiting for any execution
    /// it started (which observes the same token).
    pub fn spawn_ticker(
        self: &Arc<Self>,
        window: Duration,
        reports: mpsc::UnboundedSender<ExecutionReport>,
        cancel: CancellationToken,
    ) -> JoinHandle<()> {
        let scheduler = Arc::clone(self);

        tokio::spawn(async move {
            let mut ticker = time::interval_at(Instant::now() + window, window);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            let mut tasks = JoinSet::new();

            loop {
                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => break,
                    _ = ticker.tick() => {
                        while tasks.try_join_next().is_some() {}

                        match scheduler.tick(&mut tasks, &reports, &cancel) {
                            TickOutcome::Busy => {
                                scheduler.stats.record_skipped_tick();
                                debug!("Previous execution still running, skipping tick");
                            }
                            TickOutcome::Scheduled => debug!("Changes pending, executing command"),
                            TickOutcome::Idle => {}
                        }
                    }
                }
            }

            while tasks.join_next().await.is_some() {}
            debug!("Ticker stopped");
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::Utc;
    use pretty_assertions::assert_eq;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Runner that sleeps for `delay` and counts invocations.
    struct SlowRunner {
        delay: Duration,
        calls: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl CommandRunner for SlowRunner {
        async fn run(&self, cancel: &CancellationToken) -> ExecutionReport {
            self.calls.fetch_add(1, Ordering::SeqCst);
            tokio::select! {
                _ = cancel.cancelled() => Err(fswatcher_exec::ExecError::Cancelled),
                _ = time::sleep(self.delay) => Ok(ExecutionResult {
                    success: true,
                    exit_code: Some(0),
                    stdout: String::new(),
                    stderr: String::new(),
                    started_at: Utc::now(),
                    duration_ms: self.delay.as_millis() as u64,
                }),
            }
        }
    }

    fn scheduler(mode: TriggerMode, delay: Duration) -> (Scheduler<SlowRunner>, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let runner = SlowRunner {
            delay,
            calls: Arc::clone(&calls),
        };
        (
            Scheduler::new(mode, runner, Arc::new(SessionStats::default())),
            calls,
        )
    }

    #[test]
    fn test_trigger_mode_from_interval() {
        assert_eq!(TriggerMode::from_interval(None), TriggerMode::Immediate);
        assert_eq!(
            TriggerMode::from_interval(Some(Duration::ZERO)),
            TriggerMode::Immediate
        );
        assert_eq!(
            TriggerMode::from_interval(Some(Duration::from_secs(1))).window(),
            Some(Duration::from_secs(1))
        );
    }

    #[tokio::test]
    async fn test_immediate_mode_executes_every_event() {
        let (scheduler, _calls) = scheduler(TriggerMode::Immediate, Duration::ZERO);
        assert_eq!(scheduler.on_event(), Trigger::Execute);
        assert!(!scheduler.state().is_pending());
    }

    #[tokio::test(start_paused = true)]
    async fn test_tick_coalesces_pending_events() {
        let (scheduler, calls) = scheduler(
            TriggerMode::Windowed(Duration::from_millis(200)),
            Duration::from_millis(10),
        );
        let (reports_tx, mut reports_rx) = mpsc::unbounded_channel();
        let cancel = CancellationToken::new();
        let mut tasks = JoinSet::new();

        assert_eq!(scheduler.tick(&mut tasks, &reports_tx, &cancel), TickOutcome::Idle);

        for _ in 0..5 {
            assert_eq!(scheduler.on_event(), Trigger::Deferred);
        }
        assert_eq!(
            scheduler.tick(&mut tasks, &reports_tx, &cancel),
            TickOutcome::Scheduled
        );
        assert!(!scheduler.state().is_pending());

        while tasks.join_next().await.is_some() {}
        assert!(reports_rx.recv().await.unwrap().is_ok());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(scheduler.tick(&mut tasks, &reports_tx, &cancel), TickOutcome::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn test_busy_tick_keeps_pending_flag() {
        let (scheduler, calls) = scheduler(
            TriggerMode::Windowed(Duration::from_millis(100)),
            Duration::from_millis(500),
        );
        let (reports_tx, _reports_rx) = mpsc::unbounded_channel();
        let cancel = CancellationToken::new();
        let mut tasks = JoinSet::new();

        scheduler.on_event();
        assert_eq!(
            scheduler.tick(&mut tasks, &reports_tx, &cancel),
            TickOutcome::Scheduled
        );

        scheduler.on_event();
        assert_eq!(scheduler.tick(&mut tasks, &reports_tx, &cancel), TickOutcome::Busy);
        assert!(scheduler.state().is_pending());

        while tasks.join_next().await.is_some() {}
        assert_eq!(
            scheduler.tick(&mut tasks, &reports_tx, &cancel),
            TickOutcome::Scheduled
        );
        while tasks.join_next().await.is_some() {}
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_ticker_stops_on_cancel() {
        let (scheduler, calls) = scheduler(
            TriggerMode::Windowed(Duration::from_millis(100)),
            Duration::from_secs(60),
        );
        let scheduler = Arc::new(scheduler);
        let (reports_tx, mut reports_rx) = mpsc::unbounded_channel();
        let cancel = CancellationToken::new();

        let ticker = scheduler.spawn_ticker(Duration::from_millis(100), reports_tx, cancel.clone());
        scheduler.on_event();
        time::sleep(Duration::from_millis(150)).await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        cancel.cancel();
        ticker.await.unwrap();

        let report = reports_rx.recv().await.unwrap();
        assert!(matches!(report, Err(fswatcher_exec::ExecError::Cancelled)));
    }
}
