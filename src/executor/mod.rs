//! Parallel task executor
//!
//! An [`Executor`] launches a fixed number of workers that all run the same
//! action under one [`Backend`]:
//!
//! ```text
//!   Executor::launch(action)
//!          │
//!          ├── StatusRecord 0 ──▶ worker 0: enter ─▶ publish id ─▶ gate ─▶ action() ─▶ record result ─▶ leave
//!          ├── StatusRecord 1 ──▶ worker 1: ...
//!          └── StatusRecord N ──▶ worker N: ...
//!          │
//!          ▼
//!   launch barrier: returns once every record carries a worker id
//! ```
//!
//! Workers hold at a start gate until the backend has spawned the whole
//! batch. If spawning fails part-way, the gate aborts and the workers that
//! did start return without running the action.
//!
//! The returned [`ExecutionUnit`] is polled through a shared active counter,
//! which every backend maintains the same way.

mod backend;
mod status;
mod unit;

pub use status::StatusRecord;
pub use unit::ExecutionUnit;

use crate::config::Backend;
use crate::error::{ConfigError, WorkerError};
use crate::sync::{ActiveCounter, StartGate};
use backend::SlotBody;
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::thread;
use tracing::{debug, error};

/// Launches batches of workers
#[derive(Debug, Clone)]
pub struct Executor {
    worker_count: usize,
    backend: Backend,
    safe_mode: bool,
}

impl Executor {
    /// Create an executor running `worker_count` workers per launch
    ///
    /// Safe mode is on by default.
    pub fn new(worker_count: usize, backend: Backend) -> Result<Self, ConfigError> {
        if worker_count == 0 {
            return Err(ConfigError::ZeroWorkers);
        }

        Ok(Self {
            worker_count,
            backend,
            safe_mode: true,
        })
    }

    /// Create an executor with one worker per available CPU
    pub fn with_available_parallelism(backend: Backend) -> Self {
        Self {
            worker_count: num_cpus::get().max(1),
            backend,
            safe_mode: true,
        }
    }

    /// Choose whether dropping a launched unit waits for its workers
    pub fn with_safe_mode(mut self, safe_mode: bool) -> Self {
        self.safe_mode = safe_mode;
        self
    }

    /// Workers started per launch
    pub fn worker_count(&self) -> usize {
        self.worker_count
    }

    /// Backend used for launches
    pub fn backend(&self) -> Backend {
        self.backend
    }

    /// Whether launched units wait for their workers on drop
    pub fn is_safe_mode(&self) -> bool {
        self.safe_mode
    }

    /// Run `action` on every worker
    ///
    /// Blocks until all workers have started, not until they finish. A panic
    /// inside `action` is caught and stored in that worker's record.
    pub fn launch<F, R>(&self, action: F) -> Result<ExecutionUnit<R>, WorkerError>
    where
        F: Fn() -> R + Send + Sync + 'static,
        R: Send + Sync + 'static,
    {
        let records: Vec<Arc<StatusRecord<R>>> = (0..self.worker_count)
            .map(|_| Arc::new(StatusRecord::new()))
            .collect();
        let active = ActiveCounter::new();
        let gate = StartGate::new();

        let slot_active = active.clone();
        let slot_gate = gate.clone();
        let body: SlotBody<R> = Arc::new(move |slot: usize, record: &StatusRecord<R>| {
            run_slot(slot, &action, record, &slot_active, &slot_gate)
        });

        let handles = match backend::spawn(self.backend, &records, body) {
            Ok(handles) => handles,
            Err(e) => {
                gate.abort();
                error!(backend = %self.backend, error = %e, "Launch failed");
                return Err(e);
            }
        };
        gate.open();

        let unit = ExecutionUnit::new(self.backend, self.safe_mode, active, records, handles);
        unit.wait_until_all_launched();

        debug!(
            workers = unit.launched_count(),
            backend = %self.backend,
            safe_mode = self.safe_mode,
            "Workers launched"
        );

        Ok(unit)
    }

    /// Run `action(&args)` on every worker, binding `args` once
    pub fn launch_with<F, A, R>(&self, action: F, args: A) -> Result<ExecutionUnit<R>, WorkerError>
    where
        F: Fn(&A) -> R + Send + Sync + 'static,
        A: Send + Sync + 'static,
        R: Send + Sync + 'static,
    {
        self.launch(move || action(&args))
    }
}

/// Body of a single worker slot
fn run_slot<F, R>(
    slot: usize,
    action: &F,
    record: &StatusRecord<R>,
    active: &ActiveCounter,
    gate: &StartGate,
) where
    F: Fn() -> R,
{
    let _guard = active.enter();
    record.publish_identity(thread::current().id());

    if !gate.wait() {
        debug!(worker = slot, "Launch aborted");
        record.complete(Err(WorkerError::Aborted { id: slot }));
        return;
    }

    let outcome = panic::catch_unwind(AssertUnwindSafe(action)).map_err(|payload| {
        let message = panic_message(payload.as_ref());
        error!(worker = slot, message = %message, "Worker action panicked");
        WorkerError::Panicked { id: slot, message }
    });

    record.complete(outcome);
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
