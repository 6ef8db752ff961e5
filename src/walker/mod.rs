//! Parallel hierarchy walker
//!
//! Every worker of one [`Executor`](crate::executor::Executor) batch runs the
//! same loop against a single shared queue, re-inserting the containers it
//! discovers until the queue is empty and no worker is mid-item.
//!
//! # Architecture
//!
//! ```text
//!                     ┌─────────────────────────┐
//!                     │     ParallelWalker      │
//!                     │  - validate root        │
//!                     │  - seed (0, root)       │
//!                     └───────────┬─────────────┘
//!                                 │ Executor::launch
//!       ┌─────────────────────────┼─────────────────────────┐
//!       │                         │                         │
//! ┌─────▼─────┐             ┌─────▼─────┐             ┌─────▼─────┐
//! │  Worker 1 │             │  Worker 2 │             │  Worker N │
//! │ enumerate │             │ enumerate │             │ enumerate │
//! └─────┬─────┘             └─────┬─────┘             └─────┬─────┘
//!       │   extract_front / push_front (length) / push_back (width)
//!       └─────────────────────────┼─────────────────────────┘
//!                                 ▼
//!                     ┌─────────────────────────┐
//!                     │     SharedWorkQueue     │
//!                     └─────────────────────────┘
//! ```

pub mod coordinator;
pub mod hierarchy;
pub mod queue;
pub mod worker;

pub use coordinator::{NodeAction, ParallelWalker, WalkActions, WalkHandle, WalkProgress, WalkResult};
pub use hierarchy::{Child, ChildKind, Children, FsHierarchy, Hierarchy};
pub use queue::{QueueStats, SharedWorkQueue, WorkItem};
pub use worker::WorkerStats;
