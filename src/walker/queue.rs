//! Shared work queue for traversal items
//!
//! A single mutex-guarded deque shared by every worker. Workers only ever
//! poll it with [`SharedWorkQueue::extract_front`]; there is no blocking
//! dequeue, so an empty queue is reported immediately and the caller decides
//! whether to retry or stop.

use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};

/// A node waiting to be enumerated
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkItem<N> {
    /// Depth from root (0 = root)
    pub depth: usize,

    /// Node to enumerate
    pub node: N,
}

impl<N> WorkItem<N> {
    /// Create a new work item
    pub fn new(depth: usize, node: N) -> Self {
        Self { depth, node }
    }

    /// Create the root item
    pub fn root(node: N) -> Self {
        Self { depth: 0, node }
    }
}

/// Statistics for the work queue
#[derive(Debug, Default)]
pub struct QueueStats {
    /// Total items enqueued
    pub enqueued: AtomicU64,

    /// Total items dequeued
    pub dequeued: AtomicU64,
}

impl QueueStats {
    /// Get number of items pushed so far
    pub fn enqueued(&self) -> u64 {
        self.enqueued.load(Ordering::Relaxed)
    }

    /// Get queue throughput (dequeued items)
    pub fn throughput(&self) -> u64 {
        self.dequeued.load(Ordering::Relaxed)
    }
}

/// Mutex-guarded double-ended work queue
#[derive(Debug)]
pub struct SharedWorkQueue<T> {
    items: Mutex<VecDeque<T>>,
    stats: QueueStats,
}

impl<T> Default for SharedWorkQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> SharedWorkQueue<T> {
    /// Create an empty queue
    pub fn new() -> Self {
        Self {
            items: Mutex::new(VecDeque::new()),
            stats: QueueStats::default(),
        }
    }

    /// Create a queue holding `items` in order
    pub fn with_items(items: impl IntoIterator<Item = T>) -> Self {
        let items: VecDeque<T> = items.into_iter().collect();
        let stats = QueueStats::default();
        stats.enqueued.store(items.len() as u64, Ordering::Relaxed);
        Self {
            items: Mutex::new(items),
            stats,
        }
    }

    /// Insert at the front
    pub fn push_front(&self, item: T) {
        self.items.lock().push_front(item);
        self.stats.enqueued.fetch_add(1, Ordering::Relaxed);
    }

    /// Insert at the back
    pub fn push_back(&self, item: T) {
        self.items.lock().push_back(item);
        self.stats.enqueued.fetch_add(1, Ordering::Relaxed);
    }

    /// Remove and return the front item, or `None` without waiting
    pub fn extract_front(&self) -> Option<T> {
        let item = self.items.lock().pop_front();
        if item.is_some() {
            self.stats.dequeued.fetch_add(1, Ordering::Relaxed);
        }
        item
    }

    /// Current queue length (stale as soon as it is returned)
    pub fn len(&self) -> usize {
        self.items.lock().len()
    }

    /// Check if the queue is empty at this instant
    pub fn is_empty(&self) -> bool {
        self.items.lock().is_empty()
    }

    /// Get queue statistics
    pub fn stats(&self) -> &QueueStats {
        &self.stats
    }
}

impl<T: Clone> SharedWorkQueue<T> {
    /// Copy of the current contents, front first
    pub fn snapshot(&self) -> Vec<T> {
        self.items.lock().iter().cloned().collect()
    }
}
