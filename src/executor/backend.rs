//! Backend-specific worker spawning
//!
//! Each backend starts one worker per status record and hands back whatever
//! native completion handle it has. Completion is still observed through the
//! shared active counter so all backends poll the same way.

use crate::config::Backend;
use crate::error::WorkerError;
use crate::executor::status::StatusRecord;
use rayon::prelude::*;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use tokio::runtime::Runtime;
use tracing::debug;

/// Body run by every worker slot
pub(crate) type SlotBody<R> = Arc<dyn Fn(usize, &StatusRecord<R>) + Send + Sync>;

/// Native completion handles kept by an execution unit
#[derive(Debug)]
pub(crate) enum BackendHandles {
    /// Detached threads expose nothing to join on
    Detached,

    /// One handle per spawned blocking task, never awaited individually
    Tasks {
        runtime: BatchRuntime,
        tasks: Vec<tokio::task::JoinHandle<()>>,
    },

    /// Background thread driving the parallel-for
    Coordinator(JoinHandle<()>),
}

impl BackendHandles {
    /// Whether the native handles report completion, if they can
    pub(crate) fn is_finished(&self) -> Option<bool> {
        match self {
            BackendHandles::Detached => None,
            BackendHandles::Tasks { tasks, .. } => Some(tasks.iter().all(|t| t.is_finished())),
            BackendHandles::Coordinator(handle) => Some(handle.is_finished()),
        }
    }
}

/// Start one worker per record under the given backend
pub(crate) fn spawn<R>(
    backend: Backend,
    records: &[Arc<StatusRecord<R>>],
    body: SlotBody<R>,
) -> Result<BackendHandles, WorkerError>
where
    R: Send + Sync + 'static,
{
    match backend {
        Backend::Thread => spawn_threads(records, body),
        Backend::Future => spawn_tasks(records, body),
        Backend::DataParallel => spawn_parallel_for(records, body),
    }
}

fn spawn_threads<R>(
    records: &[Arc<StatusRecord<R>>],
    body: SlotBody<R>,
) -> Result<BackendHandles, WorkerError>
where
    R: Send + Sync + 'static,
{
    for (slot, record) in records.iter().enumerate() {
        let record = Arc::clone(record);
        let body = Arc::clone(&body);

        // Dropping the join handle detaches the thread
        thread::Builder::new()
            .name(format!("worker-{}", slot))
            .spawn(move || body(slot, record.as_ref()))
            .map_err(|e| WorkerError::SpawnFailed {
                id: slot,
                reason: e.to_string(),
            })?;
    }

    Ok(BackendHandles::Detached)
}

fn spawn_tasks<R>(
    records: &[Arc<StatusRecord<R>>],
    body: SlotBody<R>,
) -> Result<BackendHandles, WorkerError>
where
    R: Send + Sync + 'static,
{
    let runtime = build_runtime(records.len())?;

    let tasks = records
        .iter()
        .enumerate()
        .map(|(slot, record)| {
            let record = Arc::clone(record);
            let body = Arc::clone(&body);
            runtime.spawn_blocking(move || body(slot, record.as_ref()))
        })
        .collect();

    Ok(BackendHandles::Tasks {
        runtime: BatchRuntime {
            runtime: Some(runtime),
        },
        tasks,
    })
}

fn spawn_parallel_for<R>(
    records: &[Arc<StatusRecord<R>>],
    body: SlotBody<R>,
) -> Result<BackendHandles, WorkerError>
where
    R: Send + Sync + 'static,
{
    let slots = records.len();

    // A dedicated pool sized to the batch so every slot can run at once
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(slots)
        .thread_name(|i| format!("parallel-for-{}", i))
        .build()
        .map_err(|e| WorkerError::SpawnFailed {
            id: 0,
            reason: e.to_string(),
        })?;

    let records: Vec<Arc<StatusRecord<R>>> = records.to_vec();

    let coordinator = thread::Builder::new()
        .name("parallel-for".into())
        .spawn(move || {
            pool.install(|| {
                records
                    .par_iter()
                    .enumerate()
                    .with_max_len(1)
                    .for_each(|(slot, record)| body(slot, record.as_ref()));
            });
        })
        .map_err(|e| WorkerError::SpawnFailed {
            id: 0,
            reason: e.to_string(),
        })?;

    Ok(BackendHandles::Coordinator(coordinator))
}

/// Runtime owned by one future-backend batch
///
/// Its blocking pool is sized to the batch so every task can start at once,
/// whatever else is running in the process. Dropping it never waits: tasks
/// already running keep their threads until they return.
#[derive(Debug)]
pub(crate) struct BatchRuntime {
    runtime: Option<Runtime>,
}

impl Drop for BatchRuntime {
    fn drop(&mut self) {
        if let Some(runtime) = self.runtime.take() {
            runtime.shutdown_background();
        }
    }
}

/// Runtime whose blocking pool can hold every slot of the batch at once
fn build_runtime(slots: usize) -> Result<Runtime, WorkerError> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(1)
        .max_blocking_threads(slots.max(1))
        .thread_name("future-worker")
        .build()
        .map_err(|e| WorkerError::RuntimeInit(e.to_string()))?;

    debug!(blocking_threads = slots, "Future backend runtime started");
    Ok(runtime)
}
