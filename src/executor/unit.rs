//! A launched batch of workers
//!
//! Returned by [`Executor::launch`](crate::executor::Executor::launch) only
//! after every worker has published its identity. From then on the unit can
//! be polled for progress, waited on, or dropped.

use crate::config::Backend;
use crate::error::WorkerError;
use crate::executor::backend::BackendHandles;
use crate::executor::status::StatusRecord;
use crate::sync::ActiveCounter;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

/// One batch of workers running the same action
///
/// In safe mode, dropping the unit blocks until every worker has finished.
/// Otherwise the drop returns immediately; the workers keep their own `Arc`
/// to their status record, so nothing they write to is freed underneath them.
#[must_use = "dropping an execution unit in safe mode waits for all workers"]
#[derive(Debug)]
pub struct ExecutionUnit<R> {
    backend: Backend,
    safe_mode: bool,
    active: ActiveCounter,
    records: Vec<Arc<StatusRecord<R>>>,
    handles: BackendHandles,
}

impl<R> ExecutionUnit<R> {
    pub(crate) fn new(
        backend: Backend,
        safe_mode: bool,
        active: ActiveCounter,
        records: Vec<Arc<StatusRecord<R>>>,
        handles: BackendHandles,
    ) -> Self {
        Self {
            backend,
            safe_mode,
            active,
            records,
            handles,
        }
    }

    /// Backend the workers run under
    pub fn backend(&self) -> Backend {
        self.backend
    }

    /// Whether dropping the unit waits for the workers
    pub fn is_safe_mode(&self) -> bool {
        self.safe_mode
    }

    /// Number of launched workers
    pub fn launched_count(&self) -> usize {
        self.records.len()
    }

    /// Number of workers whose record is not yet finished
    ///
    /// A snapshot; workers may finish while it is being computed.
    pub fn active_count(&self) -> usize {
        self.records.iter().filter(|r| !r.is_finished()).count()
    }

    /// True once every worker action has returned or panicked
    pub fn is_finished(&self) -> bool {
        self.active.is_idle()
    }

    /// Whether the backend's own handles report completion
    ///
    /// `None` for the thread backend, whose workers are detached.
    pub fn backend_finished(&self) -> Option<bool> {
        self.handles.is_finished()
    }

    /// Status records, one per worker, in launch order
    pub fn records(&self) -> &[Arc<StatusRecord<R>>] {
        &self.records
    }

    /// Values returned by the workers that have finished normally
    pub fn results(&self) -> impl Iterator<Item = &R> + '_ {
        self.records.iter().filter_map(|r| r.result())
    }

    /// Panics caught inside worker actions
    pub fn faults(&self) -> impl Iterator<Item = &WorkerError> + '_ {
        self.records.iter().filter_map(|r| r.fault())
    }

    /// Poll until all workers have finished
    ///
    /// A zero interval yields between checks; anything else sleeps that
    /// long. Spins forever if an action never returns.
    pub fn wait_until_all_finished(&self, poll_interval: Duration) {
        while !self.active.is_idle() {
            pause(poll_interval);
        }
    }

    /// Poll until all workers have finished or `timeout` elapses
    ///
    /// Returns true if every worker finished in time.
    pub fn wait_timeout(&self, timeout: Duration, poll_interval: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        while !self.active.is_idle() {
            if Instant::now() >= deadline {
                return false;
            }
            pause(poll_interval);
        }
        true
    }

    /// Spin until every record carries a worker identity
    pub(crate) fn wait_until_all_launched(&self) {
        while self.records.iter().any(|r| !r.is_launched()) {
            thread::yield_now();
        }
    }
}

impl<R> Drop for ExecutionUnit<R> {
    fn drop(&mut self) {
        if self.safe_mode {
            self.wait_until_all_finished(Duration::ZERO);
        }
    }
}

fn pause(poll_interval: Duration) {
    if poll_interval.is_zero() {
        thread::yield_now();
    } else {
        thread::sleep(poll_interval);
    }
}
