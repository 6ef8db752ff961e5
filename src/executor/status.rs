//! Per-worker status record
//!
//! Written once by its owning worker (identity, then outcome, then the
//! finished flag) and read by anyone holding a shared handle to it.

use crate::error::WorkerError;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::OnceLock;
use std::thread::ThreadId;

/// Status of a single launched worker
///
/// Records are never cloned; the execution unit and the worker each hold an
/// `Arc` to the same record, so a detached worker can keep writing to it
/// after the unit has been dropped.
#[derive(Debug)]
pub struct StatusRecord<R> {
    /// Identity of the thread running the worker, published at start
    worker_id: OnceLock<ThreadId>,

    /// Value returned by the action, or the caught panic
    outcome: OnceLock<Result<R, WorkerError>>,

    /// Set after the outcome has been stored
    finished: AtomicBool,
}

impl<R> StatusRecord<R> {
    pub(crate) fn new() -> Self {
        Self {
            worker_id: OnceLock::new(),
            outcome: OnceLock::new(),
            finished: AtomicBool::new(false),
        }
    }

    /// Thread identity of the worker, once it has started
    pub fn worker_id(&self) -> Option<ThreadId> {
        self.worker_id.get().copied()
    }

    /// True once the worker has published its identity
    pub fn is_launched(&self) -> bool {
        self.worker_id.get().is_some()
    }

    /// Value returned by the worker action, if it completed normally
    pub fn result(&self) -> Option<&R> {
        self.outcome.get().and_then(|outcome| outcome.as_ref().ok())
    }

    /// Panic caught inside the worker action, if any
    pub fn fault(&self) -> Option<&WorkerError> {
        self.outcome.get().and_then(|outcome| outcome.as_ref().err())
    }

    /// True once the worker action has returned or panicked
    pub fn is_finished(&self) -> bool {
        self.finished.load(Ordering::Acquire)
    }

    pub(crate) fn publish_identity(&self, id: ThreadId) {
        let _ = self.worker_id.set(id);
    }

    pub(crate) fn complete(&self, outcome: Result<R, WorkerError>) {
        let _ = self.outcome.set(outcome);
        self.finished.store(true, Ordering::Release);
    }
}
