//! Integration tests for par-walker
//!
//! These tests build real directory trees under a temporary directory and
//! walk them through the public API.

use par_walker::config::{compile_patterns, Backend, WalkMode};
use par_walker::error::{ConfigError, WalkerError};
use par_walker::executor::Executor;
use par_walker::walker::{FsHierarchy, ParallelWalker, WalkActions};
use parking_lot::Mutex;
use std::collections::HashSet;
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tempfile::tempdir;

const DEPTH: usize = 3;
const SUBDIRS: usize = 2;
const FILES: usize = 3;

/// Every directory gets `files` files; directories above `depth` get `subdirs` subdirectories
fn build_tree(dir: &Path, depth: usize, subdirs: usize, files: usize) {
    for f in 0..files {
        File::create(dir.join(format!("file_{}.dat", f))).unwrap();
    }
    if depth == 0 {
        return;
    }
    for d in 0..subdirs {
        let sub = dir.join(format!("dir_{}", d));
        fs::create_dir(&sub).unwrap();
        build_tree(&sub, depth - 1, subdirs, files);
    }
}

/// FILES * (1 + SUBDIRS + ... + SUBDIRS^levels)
fn files_through(levels: usize) -> u64 {
    (0..=levels)
        .map(|k| (FILES * SUBDIRS.pow(k as u32)) as u64)
        .sum()
}

/// SUBDIRS + ... + SUBDIRS^levels
fn dirs_through(levels: usize) -> u64 {
    (1..=levels).map(|k| SUBDIRS.pow(k as u32) as u64).sum()
}

struct Counts {
    files: Arc<AtomicU64>,
    dirs: Arc<AtomicU64>,
    file_depths: Arc<Mutex<HashSet<usize>>>,
}

impl Counts {
    fn new() -> Self {
        Self {
            files: Arc::new(AtomicU64::new(0)),
            dirs: Arc::new(AtomicU64::new(0)),
            file_depths: Arc::new(Mutex::new(HashSet::new())),
        }
    }

    fn actions(&self) -> WalkActions<PathBuf> {
        let files = Arc::clone(&self.files);
        let depths = Arc::clone(&self.file_depths);
        let dirs = Arc::clone(&self.dirs);
        WalkActions::new()
            .on_leaf(move |depth, _| {
                files.fetch_add(1, Ordering::Relaxed);
                depths.lock().insert(depth);
            })
            .on_container(move |_, _| {
                dirs.fetch_add(1, Ordering::Relaxed);
            })
    }
}

fn walker(workers: usize, backend: Backend) -> ParallelWalker<FsHierarchy> {
    let executor = Executor::new(workers, backend).unwrap();
    ParallelWalker::new(FsHierarchy::new(), executor).poll_interval(Duration::from_millis(1))
}

#[test]
fn test_full_walk_counts_every_file_once() {
    let dir = tempdir().unwrap();
    build_tree(dir.path(), DEPTH, SUBDIRS, FILES);

    for backend in Backend::ALL {
        for workers in [1, 2, 32] {
            for mode in [WalkMode::Length, WalkMode::Width] {
                let counts = Counts::new();
                let result = walker(workers, backend)
                    .mode(mode)
                    .walk(dir.path().to_path_buf(), counts.actions())
                    .unwrap();

                let label = format!("{} x{} {}", backend, workers, mode.as_str());
                assert_eq!(counts.files.load(Ordering::Relaxed), files_through(DEPTH), "{}", label);
                assert_eq!(counts.dirs.load(Ordering::Relaxed), dirs_through(DEPTH), "{}", label);
                assert_eq!(result.totals.items, 1 + dirs_through(DEPTH), "{}", label);
                assert!(result.completed, "{}", label);
                assert!(result.worker_faults.is_empty(), "{}", label);
            }
        }
    }
}

#[test]
fn test_listed_paths_are_unique() {
    let dir = tempdir().unwrap();
    build_tree(dir.path(), DEPTH, SUBDIRS, FILES);

    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);

    walker(8, Backend::Thread)
        .walk(
            dir.path().to_path_buf(),
            WalkActions::new().on_leaf(move |_, path: &PathBuf| sink.lock().push(path.clone())),
        )
        .unwrap();

    let seen = seen.lock();
    let unique: HashSet<_> = seen.iter().collect();
    assert_eq!(unique.len(), seen.len());
    assert!(seen.iter().all(|p| p.is_file()));
}

#[test]
fn test_max_depth_zero_lists_root_files_only() {
    let dir = tempdir().unwrap();
    build_tree(dir.path(), DEPTH, SUBDIRS, FILES);

    for backend in Backend::ALL {
        let counts = Counts::new();
        walker(4, backend)
            .max_depth(Some(0))
            .walk(dir.path().to_path_buf(), counts.actions())
            .unwrap();

        assert_eq!(counts.files.load(Ordering::Relaxed), FILES as u64);
        assert_eq!(counts.dirs.load(Ordering::Relaxed), 0);
    }
}

#[test]
fn test_max_depth_one_above_tree_depth() {
    let dir = tempdir().unwrap();
    build_tree(dir.path(), DEPTH, SUBDIRS, FILES);

    let counts = Counts::new();
    walker(4, Backend::Thread)
        .mode(WalkMode::Width)
        .max_depth(Some(DEPTH - 1))
        .walk(dir.path().to_path_buf(), counts.actions())
        .unwrap();

    // Directories at depth D-1 are reported but never opened
    assert_eq!(counts.files.load(Ordering::Relaxed), files_through(DEPTH - 1));
    assert_eq!(counts.dirs.load(Ordering::Relaxed), dirs_through(DEPTH - 1));
    assert!(!counts.file_depths.lock().contains(&DEPTH));
}

#[test]
fn test_file_root_is_config_error() {
    let dir = tempdir().unwrap();
    let file = dir.path().join("plain.txt");
    File::create(&file).unwrap();

    let err = walker(2, Backend::Thread)
        .walk(file, WalkActions::new())
        .unwrap_err();
    assert!(matches!(err, WalkerError::Config(ConfigError::InvalidRoot { .. })));

    let err = walker(2, Backend::Thread)
        .walk(dir.path().join("missing"), WalkActions::new())
        .unwrap_err();
    assert!(matches!(err, WalkerError::Config(ConfigError::InvalidRoot { .. })));
}

#[test]
fn test_unknown_mode_and_backend_rejected() {
    assert!(matches!(
        "sideways".parse::<WalkMode>(),
        Err(ConfigError::UnknownWalkMode(_))
    ));
    assert!(matches!(
        "fibers".parse::<Backend>(),
        Err(ConfigError::UnknownBackend(_))
    ));
}

#[test]
fn test_exclude_patterns_prune_subtrees() {
    let dir = tempdir().unwrap();
    build_tree(dir.path(), 2, SUBDIRS, FILES);

    let excludes = compile_patterns(&[r"dir_0$".to_string()]).unwrap();
    let hierarchy = FsHierarchy::new().with_excludes(excludes);
    let executor = Executor::new(4, Backend::Thread).unwrap();

    let counts = Counts::new();
    ParallelWalker::new(hierarchy, executor)
        .walk(dir.path().to_path_buf(), counts.actions())
        .unwrap();

    // Root, root/dir_1, root/dir_1/dir_1
    assert_eq!(counts.files.load(Ordering::Relaxed), 3 * FILES as u64);
    assert_eq!(counts.dirs.load(Ordering::Relaxed), 2);
}

#[test]
fn test_detached_walk_still_completes() {
    let dir = tempdir().unwrap();
    build_tree(dir.path(), DEPTH, SUBDIRS, FILES);

    let executor = Executor::new(4, Backend::Thread)
        .unwrap()
        .with_safe_mode(false);
    let counts = Counts::new();
    let result = ParallelWalker::new(FsHierarchy::new(), executor)
        .walk(dir.path().to_path_buf(), counts.actions())
        .unwrap();

    assert_eq!(result.totals.leaves, files_through(DEPTH));
}

#[test]
fn test_empty_root() {
    let dir = tempdir().unwrap();

    let result = walker(4, Backend::Future)
        .walk(dir.path().to_path_buf(), WalkActions::new())
        .unwrap();

    assert_eq!(result.totals.items, 1);
    assert_eq!(result.totals.leaves, 0);
    assert!(result.completed);
}
