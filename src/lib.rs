//! par-walker - Parallel Task Executor and Hierarchy Walker
//!
//! A small engine for running one action on a fixed number of concurrent
//! workers, plus a parallel walker built on top of it that spreads a
//! growing tree of work (e.g. directory subtrees) across those workers and
//! detects on its own when nothing is left to do.
//!
//! # Features
//!
//! - **Uniform backends**: the same launch and wait API over detached OS
//!   threads, tokio blocking tasks, or a rayon parallel-for.
//!
//! - **Launch barrier**: a launch returns only once every worker has
//!   published its thread identity.
//!
//! - **Safe or detached drop**: dropping a launched batch either waits for
//!   its workers or leaves them running on shared status records.
//!
//! - **Terminating traversal**: workers stop once the shared queue is empty
//!   and no worker is still processing an item.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                        ParallelWalker                            │
//! │          (root validation, depth limit, length / width)          │
//! └─────────────────────────────┬───────────────────────────────────┘
//!                               │ launch(run_worker)
//!                               ▼
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                          Executor                                │
//! │  ┌─────────┐  ┌─────────┐  ┌─────────┐         ┌─────────┐     │
//! │  │Record 1 │  │Record 2 │  │Record 3 │  ...    │Record N │     │
//! │  └────┬────┘  └────┬────┘  └────┬────┘         └────┬────┘     │
//! │       └────────────┼────────────┼────────────────────┘          │
//! │                    ▼            ▼                               │
//! │            ┌──────────────────────────┐                         │
//! │            │  thread | future | rayon │                         │
//! │            └──────────────────────────┘                         │
//! └─────────────────────────────────────────────────────────────────┘
//!                               │
//!                               ▼
//!                    ┌──────────────────┐
//!                    │  ExecutionUnit   │
//!                    │  (poll / wait)   │
//!                    └──────────────────┘
//! ```
//!
//! # Example
//!
//! ```bash
//! # Count files under /data with one worker per CPU
//! par-walker /data
//!
//! # Breadth-first-ish ordering on a rayon pool, two levels deep
//! par-walker /data -w 16 -b data-parallel -m width -d 2
//! ```

pub mod config;
pub mod error;
pub mod executor;
pub mod progress;
pub mod sync;
pub mod walker;

pub use config::{Backend, CliArgs, WalkConfig, WalkMode};
pub use error::{Result, WalkerError};
pub use executor::{ExecutionUnit, Executor, StatusRecord};
pub use walker::{FsHierarchy, Hierarchy, ParallelWalker, WalkActions, WalkResult};
