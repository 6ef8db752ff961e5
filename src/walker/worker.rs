//! Worker loop for parallel hierarchy walking
//!
//! Every worker runs the same loop against the shared queue:
//! - Acquire: poll the queue; an empty queue goes to the idle check
//! - Process: enumerate the item, report leaves, enqueue containers
//! - Idle check: stop once the queue is empty and no worker holds an item
//!
//! A worker is counted as active from just before its successful pop until
//! all children of that item have been pushed, so "queue empty and nobody
//! active" can only be observed once no more work can appear.

use crate::config::WalkMode;
use crate::error::ItemOutcome;
use crate::sync::ActiveCounter;
use crate::walker::coordinator::WalkActions;
use crate::walker::hierarchy::{ChildKind, Hierarchy};
use crate::walker::queue::{SharedWorkQueue, WorkItem};
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use tracing::{debug, trace, warn};

/// Statistics collected by a worker
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct WorkerStats {
    /// Items taken from the queue
    pub items: u64,

    /// Leaves reported
    pub leaves: u64,

    /// Containers pushed back onto the queue
    pub containers: u64,

    /// Items skipped (permission denied, vanished)
    pub skipped: u64,

    /// Items whose enumeration failed
    pub errors: u64,
}

impl WorkerStats {
    fn record(&mut self, outcome: &ItemOutcome) {
        self.items += 1;
        match outcome {
            ItemOutcome::Success { leaves, containers } => {
                self.leaves += *leaves as u64;
                self.containers += *containers as u64;
            }
            ItemOutcome::Skipped { .. } => self.skipped += 1,
            ItemOutcome::Failed { .. } => self.errors += 1,
        }
    }

    /// Add another worker's counts to these
    pub fn merge(&mut self, other: &WorkerStats) {
        self.items += other.items;
        self.leaves += other.leaves;
        self.containers += other.containers;
        self.skipped += other.skipped;
        self.errors += other.errors;
    }
}

/// State shared by all workers of one walk
pub(crate) struct WalkContext<H: Hierarchy> {
    pub(crate) hierarchy: Arc<H>,
    pub(crate) queue: Arc<SharedWorkQueue<WorkItem<H::Node>>>,
    pub(crate) active: ActiveCounter,
    pub(crate) actions: WalkActions<H::Node>,
    pub(crate) max_depth: Option<usize>,
    pub(crate) mode: WalkMode,
    pub(crate) shutdown: Arc<AtomicBool>,
    pub(crate) processed: Arc<AtomicU64>,
    pub(crate) next_worker: AtomicUsize,
}

impl<H: Hierarchy> WalkContext<H> {
    /// Containers found under an item at `depth` are enqueued only below the limit
    fn should_descend(&self, depth: usize) -> bool {
        self.max_depth.map_or(true, |max| depth < max)
    }

    fn enqueue(&self, item: WorkItem<H::Node>) {
        match self.mode {
            WalkMode::Length => self.queue.push_front(item),
            WalkMode::Width => self.queue.push_back(item),
        }
    }
}

/// Main worker loop
pub(crate) fn run_worker<H: Hierarchy>(ctx: &WalkContext<H>) -> WorkerStats {
    let id = ctx.next_worker.fetch_add(1, Ordering::Relaxed);
    let mut stats = WorkerStats::default();

    debug!(worker = id, "Worker starting");

    loop {
        if ctx.shutdown.load(Ordering::Relaxed) {
            debug!(worker = id, "Stop requested");
            break;
        }

        // Idle workers stay off the counter so they cannot mask quiescence
        if ctx.queue.is_empty() {
            if ctx.active.is_idle() && ctx.queue.is_empty() {
                break;
            }
            thread::yield_now();
            continue;
        }

        // The peek above is only a hint; the pop below decides whether there is work
        let guard = ctx.active.enter();
        let Some(item) = ctx.queue.extract_front() else {
            drop(guard);
            continue;
        };

        let outcome = process_item(ctx, &item);
        drop(guard);

        match &outcome {
            ItemOutcome::Success { leaves, containers } => {
                trace!(worker = id, depth = item.depth, node = ?item.node, leaves, containers, "Item processed");
            }
            ItemOutcome::Skipped { reason } => {
                debug!(worker = id, node = ?item.node, reason = %reason, "Item skipped");
            }
            ItemOutcome::Failed { error } => {
                warn!(worker = id, node = ?item.node, error = %error, "Item failed");
            }
        }

        stats.record(&outcome);
        ctx.processed.fetch_add(1, Ordering::Relaxed);
    }

    debug!(
        worker = id,
        items = stats.items,
        leaves = stats.leaves,
        "Worker shutting down"
    );

    stats
}

/// Enumerate one item, reporting leaves and enqueueing containers
fn process_item<H: Hierarchy>(ctx: &WalkContext<H>, item: &WorkItem<H::Node>) -> ItemOutcome {
    let children = match ctx.hierarchy.children(&item.node) {
        Ok(children) => children,
        Err(e) if e.is_recoverable() => {
            return ItemOutcome::Skipped {
                reason: e.to_string(),
            }
        }
        Err(e) => return ItemOutcome::Failed { error: e },
    };

    let descend = ctx.should_descend(item.depth);
    let mut leaves = 0;
    let mut containers = 0;

    for child in children {
        match child.kind {
            ChildKind::Leaf => {
                ctx.actions.visit_leaf(item.depth, &child.node);
                leaves += 1;
            }
            ChildKind::Container if descend => {
                ctx.actions.visit_container(item.depth, &child.node);
                ctx.enqueue(WorkItem::new(item.depth + 1, child.node));
                containers += 1;
            }
            ChildKind::Container => {}
        }
    }

    ItemOutcome::Success { leaves, containers }
}
