//! Walk coordinator - drives a parallel hierarchy walk
//!
//! The coordinator is responsible for:
//! - Validating the root before any worker starts
//! - Seeding the shared queue and launching the workers on an [`Executor`]
//! - Progress snapshots and the cooperative stop signal
//! - Aggregating per-worker statistics once the walk is quiescent

use crate::config::WalkMode;
use crate::error::{Result, WorkerError};
use crate::executor::{ExecutionUnit, Executor};
use crate::sync::ActiveCounter;
use crate::walker::hierarchy::Hierarchy;
use crate::walker::queue::{QueueStats, SharedWorkQueue, WorkItem};
use crate::walker::worker::{run_worker, WalkContext, WorkerStats};
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{info, warn};

/// Callback invoked with `(depth, node)`
pub type NodeAction<N> = Arc<dyn Fn(usize, &N) + Send + Sync>;

/// Caller-supplied actions run by the workers
///
/// Both actions are optional. They are called concurrently from every
/// worker, so any state they touch must be synchronized.
pub struct WalkActions<N> {
    leaf: Option<NodeAction<N>>,
    container: Option<NodeAction<N>>,
}

impl<N> WalkActions<N> {
    pub fn new() -> Self {
        Self {
            leaf: None,
            container: None,
        }
    }

    /// Called once for every leaf found, with the depth of its parent
    pub fn on_leaf<F>(mut self, action: F) -> Self
    where
        F: Fn(usize, &N) + Send + Sync + 'static,
    {
        self.leaf = Some(Arc::new(action));
        self
    }

    /// Called for every container just before it is queued
    pub fn on_container<F>(mut self, action: F) -> Self
    where
        F: Fn(usize, &N) + Send + Sync + 'static,
    {
        self.container = Some(Arc::new(action));
        self
    }

    pub(crate) fn visit_leaf(&self, depth: usize, node: &N) {
        if let Some(action) = &self.leaf {
            action(depth, node);
        }
    }

    pub(crate) fn visit_container(&self, depth: usize, node: &N) {
        if let Some(action) = &self.container {
            action(depth, node);
        }
    }
}

impl<N> Clone for WalkActions<N> {
    fn clone(&self) -> Self {
        Self {
            leaf: self.leaf.clone(),
            container: self.container.clone(),
        }
    }
}

impl<N> Default for WalkActions<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<N> fmt::Debug for WalkActions<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WalkActions")
            .field("on_leaf", &self.leaf.is_some())
            .field("on_container", &self.container.is_some())
            .finish()
    }
}

/// Parallel walker over any [`Hierarchy`]
#[derive(Debug)]
pub struct ParallelWalker<H: Hierarchy> {
    hierarchy: Arc<H>,
    executor: Executor,
    max_depth: Option<usize>,
    mode: WalkMode,
    poll_interval: Duration,
    shutdown: Arc<AtomicBool>,
}

impl<H: Hierarchy> ParallelWalker<H> {
    /// Create a walker with no depth limit in length mode
    pub fn new(hierarchy: H, executor: Executor) -> Self {
        Self {
            hierarchy: Arc::new(hierarchy),
            executor,
            max_depth: None,
            mode: WalkMode::default(),
            poll_interval: Duration::from_millis(10),
            shutdown: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Containers are not descended into below this depth (`None` = unlimited)
    pub fn max_depth(mut self, max_depth: Option<usize>) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn mode(mut self, mode: WalkMode) -> Self {
        self.mode = mode;
        self
    }

    /// Interval used when waiting for the workers
    pub fn poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    /// Get a clone of the shutdown flag (for signal handlers)
    ///
    /// The flag is shared by every walk started from this walker. Once set,
    /// running workers stop before their next item and later walks stop
    /// immediately.
    pub fn shutdown_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.shutdown)
    }

    pub fn executor(&self) -> &Executor {
        &self.executor
    }

    /// Start walking from `root` and return once every worker is running
    ///
    /// An invalid root fails here, before any worker is spawned.
    pub fn start(&self, root: H::Node, actions: WalkActions<H::Node>) -> Result<WalkHandle<H>> {
        self.hierarchy.validate_root(&root)?;

        info!(
            root = ?root,
            workers = self.executor.worker_count(),
            backend = %self.executor.backend(),
            mode = ?self.mode,
            max_depth = ?self.max_depth,
            "Starting walk"
        );

        let ctx = Arc::new(WalkContext {
            hierarchy: Arc::clone(&self.hierarchy),
            queue: Arc::new(SharedWorkQueue::with_items([WorkItem::root(root)])),
            active: ActiveCounter::new(),
            actions,
            max_depth: self.max_depth,
            mode: self.mode,
            shutdown: Arc::clone(&self.shutdown),
            processed: Arc::new(AtomicU64::new(0)),
            next_worker: AtomicUsize::new(0),
        });

        let start_time = Instant::now();
        let worker_ctx = Arc::clone(&ctx);
        let unit = self.executor.launch(move || run_worker(&worker_ctx))?;

        Ok(WalkHandle {
            ctx,
            unit,
            start_time,
            poll_interval: self.poll_interval,
        })
    }

    /// Walk from `root` and wait for quiescence
    pub fn walk(&self, root: H::Node, actions: WalkActions<H::Node>) -> Result<WalkResult> {
        Ok(self.start(root, actions)?.wait())
    }
}

/// A walk in progress
///
/// Dropping the handle without calling [`WalkHandle::wait`] follows the
/// executor's safe mode: it either waits for the workers or detaches them.
#[must_use]
pub struct WalkHandle<H: Hierarchy> {
    ctx: Arc<WalkContext<H>>,
    unit: ExecutionUnit<WorkerStats>,
    start_time: Instant,
    poll_interval: Duration,
}

impl<H: Hierarchy> WalkHandle<H> {
    /// Snapshot of the walk's progress
    pub fn progress(&self) -> WalkProgress {
        WalkProgress {
            items: self.ctx.processed.load(Ordering::Relaxed),
            queue_size: self.ctx.queue.len(),
            active_workers: self.ctx.active.load(),
            running_workers: self.unit.active_count(),
            total_workers: self.unit.launched_count(),
            elapsed: self.start_time.elapsed(),
        }
    }

    /// True once every worker has exited
    pub fn is_finished(&self) -> bool {
        self.unit.is_finished()
    }

    /// Ask the workers to stop before their next item
    pub fn stop(&self) {
        self.ctx.shutdown.store(true, Ordering::SeqCst);
    }

    /// Queue counters for this walk
    pub fn queue_stats(&self) -> &QueueStats {
        self.ctx.queue.stats()
    }

    /// The underlying batch of workers
    pub fn execution_unit(&self) -> &ExecutionUnit<WorkerStats> {
        &self.unit
    }

    /// Wait for every worker to exit and collect the results
    pub fn wait(self) -> WalkResult {
        let WalkHandle {
            ctx,
            unit,
            start_time,
            poll_interval,
        } = self;

        unit.wait_until_all_finished(poll_interval);
        let duration = start_time.elapsed();

        let per_worker: Vec<WorkerStats> = unit.results().copied().collect();
        let mut totals = WorkerStats::default();
        for stats in &per_worker {
            totals.merge(stats);
        }

        let worker_faults: Vec<WorkerError> = unit.faults().cloned().collect();
        for fault in &worker_faults {
            warn!(error = %fault, "Worker ended with a fault");
        }

        let completed = !ctx.shutdown.load(Ordering::SeqCst);

        info!(
            items = totals.items,
            leaves = totals.leaves,
            containers = totals.containers,
            skipped = totals.skipped,
            errors = totals.errors,
            faults = worker_faults.len(),
            duration_ms = duration.as_millis() as u64,
            completed,
            "Walk completed"
        );

        WalkResult {
            totals,
            per_worker,
            worker_faults,
            workers: unit.launched_count(),
            enqueued: ctx.queue.stats().enqueued(),
            duration,
            completed,
        }
    }
}

impl<H: Hierarchy> fmt::Debug for WalkHandle<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WalkHandle")
            .field("unit", &self.unit)
            .field("progress", &self.progress())
            .finish()
    }
}

/// Progress information for display
#[derive(Debug, Clone)]
pub struct WalkProgress {
    /// Items processed
    pub items: u64,

    /// Current queue size
    pub queue_size: usize,

    /// Workers currently holding an item
    pub active_workers: usize,

    /// Workers that have not exited yet
    pub running_workers: usize,

    /// Total workers
    pub total_workers: usize,

    /// Elapsed time
    pub elapsed: Duration,
}

impl WalkProgress {
    /// Calculate items per second rate
    pub fn items_per_second(&self) -> f64 {
        rate(self.items, self.elapsed)
    }
}

/// Result of a completed walk
#[derive(Debug, Clone)]
pub struct WalkResult {
    /// Counts summed over all workers
    pub totals: WorkerStats,

    /// Counts of each worker that exited normally
    pub per_worker: Vec<WorkerStats>,

    /// Panics caught inside worker actions
    pub worker_faults: Vec<WorkerError>,

    /// Workers launched
    pub workers: usize,

    /// Items ever pushed to the queue, root included
    pub enqueued: u64,

    /// Time taken for the walk
    pub duration: Duration,

    /// Whether the walk completed (vs was interrupted)
    pub completed: bool,
}

impl WalkResult {
    pub fn items_per_second(&self) -> f64 {
        rate(self.totals.items, self.duration)
    }
}

fn rate(count: u64, elapsed: Duration) -> f64 {
    let secs = elapsed.as_secs_f64();
    if secs > 0.0 {
        count as f64 / secs
    } else {
        0.0
    }
}
