//! Counters collected over a watch session.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

/// Live counters, shared between the consumer loop and the ticker.
#[derive(Debug, Default)]
pub struct SessionStats {
    events_seen: AtomicU64,
    events_ignored: AtomicU64,
    executions: AtomicU64,
    failures: AtomicU64,
    skipped_ticks: AtomicU64,
}

impl SessionStats {
    pub fn record_event(&self) {
        self.events_seen.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_ignored(&self) {
        self.events_ignored.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_execution(&self) {
        self.executions.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_failure(&self) {
        self.failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_skipped_tick(&self) {
        self.skipped_ticks.fetch_add(1, Ordering::Relaxed);
    }

    /// Snapshot the counters.
    pub fn summary(&self, watched_directories: usize) -> SessionSummary {
        SessionSummary {
            events_seen: self.events_seen.load(Ordering::Relaxed),
            events_ignored: self.events_ignored.load(Ordering::Relaxed),
            executions: self.executions.load(Ordering::Relaxed),
            failures: self.failures.load(Ordering::Relaxed),
            skipped_ticks: self.skipped_ticks.load(Ordering::Relaxed),
            watched_directories,
        }
    }
}

/// What a finished session did.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SessionSummary {
    /// Events received from the OS primitive.
    pub events_seen: u64,

    /// Events dropped by the ignore set, as pure access notifications, or
    /// as the first write to a file just reported created.
    pub events_ignored: u64,

    /// Command executions that ran to completion.
    pub executions: u64,

    /// Executions that failed to start or exited non-zero.
    pub failures: u64,

    /// Windowed-mode ticks skipped because an execution was still running.
    pub skipped_ticks: u64,

    /// Size of the watch set at shutdown.
    pub watched_directories: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_summary_snapshots_counters() {
        let stats = SessionStats::default();
        stats.record_event();
        stats.record_event();
        stats.record_ignored();
        stats.record_execution();
        stats.record_failure();
        stats.record_skipped_tick();

        assert_eq!(
            stats.summary(3),
            SessionSummary {
                events_seen: 2,
                events_ignored: 1,
                executions: 1,
                failures: 1,
                skipped_ticks: 1,
                watched_directories: 3,
            }
        );
    }
}
