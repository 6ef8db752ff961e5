//! Configuration types for par-walker
//!
//! This module defines:
//! - The execution backend and walk ordering enums
//! - CLI argument parsing using clap derive macros
//! - Runtime configuration with validation

use crate::error::ConfigError;
use clap::Parser;
use regex::Regex;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

/// Maximum reasonable worker count
pub const MAX_WORKERS: usize = 512;

/// Parallel execution mechanism used to run a batch of workers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Backend {
    /// One detached OS thread per worker
    Thread,
    /// One blocking task per worker on a tokio runtime built for the batch
    Future,
    /// One rayon parallel-for over the worker slots, driven from a background thread
    DataParallel,
}

impl Backend {
    /// All backends, in declaration order
    pub const ALL: [Backend; 3] = [Backend::Thread, Backend::Future, Backend::DataParallel];

    /// Canonical name
    pub fn as_str(self) -> &'static str {
        match self {
            Backend::Thread => "thread",
            Backend::Future => "future",
            Backend::DataParallel => "data-parallel",
        }
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Backend {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "thread" | "threads" => Ok(Backend::Thread),
            "future" | "futures" | "async" => Ok(Backend::Future),
            "data-parallel" | "data_parallel" | "parallel-for" | "rayon" => Ok(Backend::DataParallel),
            _ => Err(ConfigError::UnknownBackend(s.to_string())),
        }
    }
}

/// Local ordering preference for newly discovered containers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum WalkMode {
    /// Push to the front of the queue (depth-first-like)
    #[default]
    Length,
    /// Push to the back of the queue (breadth-first-like)
    Width,
}

impl WalkMode {
    /// Canonical name
    pub fn as_str(self) -> &'static str {
        match self {
            WalkMode::Length => "length",
            WalkMode::Width => "width",
        }
    }
}

impl fmt::Display for WalkMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WalkMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "length" | "depth" => Ok(WalkMode::Length),
            "width" | "breadth" => Ok(WalkMode::Width),
            _ => Err(ConfigError::UnknownWalkMode(s.to_string())),
        }
    }
}

/// Parallel directory walker
#[derive(Parser, Debug, Clone)]
#[command(
    name = "par-walker",
    version,
    about = "Parallel directory walker",
    long_about = "Walks a directory tree with a pool of workers sharing one work queue.\n\n\
                  Workers re-insert discovered subdirectories into the queue and stop once\n\
                  the queue is empty and no worker is still processing a directory.",
    after_help = "EXAMPLES:\n    \
        par-walker /data\n    \
        par-walker /data -w 16 -b data-parallel -m width\n    \
        par-walker /data -d 2 --list --exclude '\\.git$'"
)]
pub struct CliArgs {
    /// Directory to walk
    #[arg(value_name = "ROOT")]
    pub root: PathBuf,

    /// Number of workers
    #[arg(
        short = 'w',
        long,
        default_value_t = default_workers(),
        value_name = "NUM"
    )]
    pub workers: usize,

    /// Execution backend (thread, future, data-parallel)
    #[arg(short = 'b', long, default_value = "thread", value_name = "BACKEND")]
    pub backend: Backend,

    /// Queue ordering for discovered directories (length, width)
    #[arg(short = 'm', long, default_value = "length", value_name = "MODE")]
    pub mode: WalkMode,

    /// Maximum directory depth (unlimited if not set)
    #[arg(short = 'd', long, value_name = "NUM")]
    pub max_depth: Option<usize>,

    /// Exclude paths matching pattern (can be repeated)
    #[arg(long = "exclude", value_name = "PATTERN", action = clap::ArgAction::Append)]
    pub exclude_patterns: Vec<String>,

    /// Descend into symlinked directories
    #[arg(long)]
    pub follow_symlinks: bool,

    /// Print a progress snapshot and exit without waiting for the workers
    #[arg(long)]
    pub detach: bool,

    /// Completion poll interval in milliseconds (0 = yield)
    #[arg(long, default_value = "10", value_name = "MS")]
    pub poll_ms: u64,

    /// Print every file as it is found
    #[arg(long)]
    pub list: bool,

    /// Quiet mode - suppress progress output
    #[arg(short = 'q', long)]
    pub quiet: bool,

    /// Verbose output (show skipped directories)
    #[arg(short = 'v', long)]
    pub verbose: bool,
}

fn default_workers() -> usize {
    num_cpus::get()
}

/// Validated runtime configuration
#[derive(Debug, Clone)]
pub struct WalkConfig {
    /// Root directory
    pub root: PathBuf,

    /// Number of workers
    pub worker_count: usize,

    /// Execution backend
    pub backend: Backend,

    /// Queue ordering
    pub mode: WalkMode,

    /// Maximum traversal depth
    pub max_depth: Option<usize>,

    /// Compiled exclude patterns
    pub exclude_patterns: Vec<Regex>,

    /// Descend into symlinked directories
    pub follow_symlinks: bool,

    /// Wait for workers when the execution unit is dropped
    pub safe_mode: bool,

    /// Completion poll interval
    pub poll_interval: Duration,

    /// Print every leaf
    pub list: bool,

    /// Show progress indicator
    pub show_progress: bool,

    /// Verbose logging
    pub verbose: bool,
}

impl WalkConfig {
    /// Create and validate configuration from CLI arguments
    pub fn from_args(args: CliArgs) -> Result<Self, ConfigError> {
        // Validate worker count
        if args.workers == 0 || args.workers > MAX_WORKERS {
            return Err(ConfigError::InvalidWorkerCount {
                count: args.workers,
                max: MAX_WORKERS,
            });
        }

        // Compile exclude patterns
        let exclude_patterns = compile_patterns(&args.exclude_patterns)?;

        Ok(Self {
            root: args.root,
            worker_count: args.workers,
            backend: args.backend,
            mode: args.mode,
            max_depth: args.max_depth,
            exclude_patterns,
            follow_symlinks: args.follow_symlinks,
            safe_mode: !args.detach,
            poll_interval: Duration::from_millis(args.poll_ms),
            list: args.list,
            show_progress: !args.quiet,
            verbose: args.verbose,
        })
    }
}

/// Compile exclude patterns, reporting the first invalid one
pub fn compile_patterns(patterns: &[String]) -> Result<Vec<Regex>, ConfigError> {
    patterns
        .iter()
        .map(|p| {
            Regex::new(p).map_err(|e| ConfigError::InvalidExcludePattern {
                pattern: p.clone(),
                reason: e.to_string(),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(extra: &[&str]) -> CliArgs {
        let mut argv = vec!["par-walker", "/tmp"];
        argv.extend_from_slice(extra);
        CliArgs::parse_from(argv)
    }

    #[test]
    fn test_parse_backend() {
        assert_eq!("thread".parse::<Backend>().unwrap(), Backend::Thread);
        assert_eq!("Future".parse::<Backend>().unwrap(), Backend::Future);
        assert_eq!("rayon".parse::<Backend>().unwrap(), Backend::DataParallel);
        assert_eq!(
            "fibers".parse::<Backend>(),
            Err(ConfigError::UnknownBackend("fibers".into()))
        );
    }

    #[test]
    fn test_parse_walk_mode() {
        assert_eq!("length".parse::<WalkMode>().unwrap(), WalkMode::Length);
        assert_eq!("WIDTH".parse::<WalkMode>().unwrap(), WalkMode::Width);
        assert_eq!(
            "spiral".parse::<WalkMode>(),
            Err(ConfigError::UnknownWalkMode("spiral".into()))
        );
    }

    #[test]
    fn test_backend_round_trip_names() {
        for backend in Backend::ALL {
            assert_eq!(backend.to_string().parse::<Backend>().unwrap(), backend);
        }
    }

    #[test]
    fn test_config_from_args() {
        let config = WalkConfig::from_args(args(&[
            "-w", "4", "-b", "future", "-m", "width", "-d", "3", "--detach",
        ]))
        .unwrap();

        assert_eq!(config.worker_count, 4);
        assert_eq!(config.backend, Backend::Future);
        assert_eq!(config.mode, WalkMode::Width);
        assert_eq!(config.max_depth, Some(3));
        assert!(!config.safe_mode);
        assert!(config.show_progress);
    }

    #[test]
    fn test_invalid_worker_count() {
        let err = WalkConfig::from_args(args(&["-w", "0"])).unwrap_err();
        assert_eq!(
            err,
            ConfigError::InvalidWorkerCount {
                count: 0,
                max: MAX_WORKERS
            }
        );

        assert!(WalkConfig::from_args(args(&["-w", "513"])).is_err());
    }

    #[test]
    fn test_invalid_exclude_pattern() {
        let err = WalkConfig::from_args(args(&["--exclude", "("])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidExcludePattern { .. }));
    }

    #[test]
    fn test_unknown_mode_rejected_by_cli() {
        let result = CliArgs::try_parse_from(["par-walker", "/tmp", "-m", "spiral"]);
        assert!(result.is_err());
    }
}
