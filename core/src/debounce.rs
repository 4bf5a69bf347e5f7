//! Shared debounce state for windowed mode.
//!
//! The event consumer sets the pending flag; the ticker test-and-clears it.
//! A separate busy flag guarantees at most one execution in flight.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Pending and busy flags shared by the event consumer and the ticker.
#[derive(Debug, Default)]
pub struct DebounceState {
    /// At least one qualifying event arrived since the last clear.
    pending: AtomicBool,

    /// An execution started by a tick has not finished yet.
    busy: AtomicBool,
}

impl DebounceState {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Record a qualifying event.
    pub fn mark_pending(&self) {
        self.pending.store(true, Ordering::Release);
    }

    pub fn is_pending(&self) -> bool {
        self.pending.load(Ordering::Acquire)
    }

    /// Atomically read and clear the pending flag.
    ///
    /// An event racing with the clear is either observed by this call or
    /// left pending for the next one, never lost and never counted twice.
    pub fn take_pending(&self) -> bool {
        self.pending.swap(false, Ordering::AcqRel)
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    /// Claim the right to execute. Returns `None` while another execution
    /// holds it. The claim is released when the permit is dropped.
    pub fn try_begin(self: &Arc<Self>) -> Option<ExecutionPermit> {
        self.busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| ExecutionPermit {
                state: Arc::clone(self),
            })
    }
}

/// Proof that the holder is the only execution in flight.
#[derive(Debug)]
pub struct ExecutionPermit {
    state: Arc<DebounceState>,
}

impl Drop for ExecutionPermit {
    fn drop(&mut self) {
        self.state.busy.store(false, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use std::thread;

    #[test]
    fn test_take_pending_clears_flag() {
        let state = DebounceState::new();
        assert!(!state.take_pending());

        state.mark_pending();
        state.mark_pending();
        assert!(state.is_pending());
        assert!(state.take_pending());
        assert!(!state.take_pending());
    }

    #[test]
    fn test_permit_is_exclusive_until_dropped() {
        let state = DebounceState::new();

        let permit = state.try_begin().unwrap();
        assert!(state.is_busy());
        assert!(state.try_begin().is_none());

        drop(permit);
        assert!(!state.is_busy());
        assert!(state.try_begin().is_some());
    }

    #[test]
    fn test_concurrent_marks_are_taken_exactly_once() {
        let state = DebounceState::new();
        let taken = Arc::new(AtomicUsize::new(0));

        for _ in 0..100 {
            state.mark_pending();
            let handles: Vec<_> = (0..4)
                .map(|_| {
                    let state = Arc::clone(&state);
                    let taken = Arc::clone(&taken);
                    thread::spawn(move || {
                        if state.take_pending() {
                            taken.fetch_add(1, Ordering::SeqCst);
                        }
                    })
                })
                .collect();
            for handle in handles {
                handle.join().unwrap();
            }
        }

        assert_eq!(taken.load(Ordering::SeqCst), 100);
    }

    #[test]
    fn test_only_one_concurrent_permit() {
        let state = DebounceState::new();
        let granted = Arc::new(AtomicUsize::new(0));

        let permits: Vec<_> = (0..8)
            .map(|_| {
                let state = Arc::clone(&state);
                let granted = Arc::clone(&granted);
                thread::spawn(move || {
                    let permit = state.try_begin();
                    if permit.is_some() {
                        granted.fetch_add(1, Ordering::SeqCst);
                    }
                    permit
                })
            })
            .map(|handle| handle.join().unwrap())
            .collect();

        assert_eq!(granted.load(Ordering::SeqCst), 1);
        drop(permits);
        assert!(!state.is_busy());
    }
}
