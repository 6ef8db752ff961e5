//! Shared active-worker counter
//!
//! Both the executor (one increment per running worker action) and the
//! walker (one increment per work item being processed) track activity
//! through an `ActiveCounter`. The counter is only ever moved through a
//! `WorkGuard`, so it is decremented even when the guarded work unwinds.
//!
//! `StartGate` holds freshly spawned workers back until the whole batch has
//! been spawned.

use std::sync::atomic::{AtomicU8, AtomicUsize, Ordering};
use std::sync::Arc;

/// Cloneable handle to a shared count of in-flight work
#[derive(Debug, Clone, Default)]
pub struct ActiveCounter {
    inner: Arc<AtomicUsize>,
}

impl ActiveCounter {
    /// Create a counter starting at zero
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark one unit of work as active until the guard is dropped
    pub fn enter(&self) -> WorkGuard<'_> {
        WorkGuard::new(self)
    }

    /// Current number of active units
    pub fn load(&self) -> usize {
        self.inner.load(Ordering::SeqCst)
    }

    /// True when nothing is active
    pub fn is_idle(&self) -> bool {
        self.load() == 0
    }
}

/// RAII guard for marking work as active
pub struct WorkGuard<'a> {
    counter: &'a ActiveCounter,
}

impl<'a> WorkGuard<'a> {
    /// Create a new work guard (marks work as active)
    pub fn new(counter: &'a ActiveCounter) -> Self {
        counter.inner.fetch_add(1, Ordering::SeqCst);
        Self { counter }
    }
}

impl Drop for WorkGuard<'_> {
    fn drop(&mut self) {
        self.counter.inner.fetch_sub(1, Ordering::SeqCst);
    }
}

const GATE_PENDING: u8 = 0;
const GATE_OPEN: u8 = 1;
const GATE_ABORTED: u8 = 2;

/// One-shot go / abort signal shared by a batch of workers
#[derive(Debug, Clone, Default)]
pub struct StartGate {
    state: Arc<AtomicU8>,
}

impl StartGate {
    /// Create a closed gate
    pub fn new() -> Self {
        Self::default()
    }

    /// Let every waiting worker proceed
    pub fn open(&self) {
        let _ = self.state.compare_exchange(
            GATE_PENDING,
            GATE_OPEN,
            Ordering::AcqRel,
            Ordering::Acquire,
        );
    }

    /// Tell every waiting worker to return without running
    pub fn abort(&self) {
        let _ = self.state.compare_exchange(
            GATE_PENDING,
            GATE_ABORTED,
            Ordering::AcqRel,
            Ordering::Acquire,
        );
    }

    /// Spin until the gate is decided; true if it was opened
    pub fn wait(&self) -> bool {
        loop {
            match self.state.load(Ordering::Acquire) {
                GATE_PENDING => std::thread::yield_now(),
                state => return state == GATE_OPEN,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_guard_tracks_activity() {
        let counter = ActiveCounter::new();
        assert!(counter.is_idle());

        let first = counter.enter();
        let second = counter.enter();
        assert_eq!(counter.load(), 2);

        drop(first);
        assert_eq!(counter.load(), 1);

        drop(second);
        assert!(counter.is_idle());
    }

    #[test]
    fn test_guard_released_on_unwind() {
        let counter = ActiveCounter::new();
        let shared = counter.clone();

        let result = std::panic::catch_unwind(move || {
            let _guard = shared.enter();
            panic!("work failed");
        });

        assert!(result.is_err());
        assert!(counter.is_idle());
    }

    #[test]
    fn test_start_gate_open() {
        let gate = StartGate::new();
        let waiter = gate.clone();
        let handle = std::thread::spawn(move || waiter.wait());

        gate.open();
        assert!(handle.join().unwrap());
    }

    #[test]
    fn test_start_gate_decided_once() {
        let gate = StartGate::new();
        gate.abort();
        gate.open();
        assert!(!gate.wait());
    }
}
