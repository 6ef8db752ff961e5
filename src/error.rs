//! Error types for par-walker
//!
//! This module defines the error hierarchy that covers:
//! - Configuration errors (always raised before any worker starts)
//! - Worker errors (spawn failures and caught panics inside worker actions)
//! - Enumeration errors (listing the children of one node)
//!
//! Configuration and launch errors are the only ones a caller sees as a
//! normal error result. Enumeration errors on a single node are absorbed by
//! the walker, and worker panics are recorded per worker instead of aborting
//! the batch.

use thiserror::Error;

/// Top-level error type for par-walker
#[derive(Error, Debug)]
pub enum WalkerError {
    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Worker/concurrency errors
    #[error("Worker error: {0}")]
    Worker(#[from] WorkerError),
}

/// Configuration errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// No workers requested
    #[error("Worker count must be greater than zero")]
    ZeroWorkers,

    /// Invalid worker count
    #[error("Invalid worker count {count}: must be between 1 and {max}")]
    InvalidWorkerCount { count: usize, max: usize },

    /// The starting node is not a container
    #[error("Invalid walk root '{root}': {reason}")]
    InvalidRoot { root: String, reason: String },

    /// Unrecognized traversal ordering
    #[error("Unknown walk mode '{0}': expected 'length' or 'width'")]
    UnknownWalkMode(String),

    /// Unrecognized execution backend
    #[error("Unknown backend '{0}': expected 'thread', 'future' or 'data-parallel'")]
    UnknownBackend(String),

    /// Invalid exclude pattern
    #[error("Invalid exclude pattern '{pattern}': {reason}")]
    InvalidExcludePattern { pattern: String, reason: String },
}

/// Worker thread errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WorkerError {
    /// The backend could not start a worker
    #[error("Failed to spawn worker {id}: {reason}")]
    SpawnFailed { id: usize, reason: String },

    /// The async runtime backing the future backend could not be built
    #[error("Failed to initialize async runtime: {0}")]
    RuntimeInit(String),

    /// The worker action panicked
    #[error("Worker {id} panicked: {message}")]
    Panicked { id: usize, message: String },

    /// The batch failed to launch, so the worker never ran its action
    #[error("Worker {id} aborted: launch failed")]
    Aborted { id: usize },
}

/// Errors raised while listing the children of a single node
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EnumerateError {
    /// Permission denied
    #[error("Permission denied: '{node}'")]
    PermissionDenied { node: String },

    /// Node vanished between discovery and enumeration
    #[error("Node not found: '{node}'")]
    NotFound { node: String },

    /// Any other I/O failure
    #[error("Failed to enumerate '{node}': {reason}")]
    Io { node: String, reason: String },
}

impl EnumerateError {
    /// Check if this error is recoverable (the node is skipped)
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            EnumerateError::PermissionDenied { .. } | EnumerateError::NotFound { .. }
        )
    }

    /// Classify an I/O error raised while enumerating `node`
    pub fn from_io(node: impl Into<String>, err: &std::io::Error) -> Self {
        let node = node.into();
        match err.kind() {
            std::io::ErrorKind::PermissionDenied => EnumerateError::PermissionDenied { node },
            std::io::ErrorKind::NotFound => EnumerateError::NotFound { node },
            _ => EnumerateError::Io {
                node,
                reason: err.to_string(),
            },
        }
    }
}

/// Result type alias for WalkerError
pub type Result<T> = std::result::Result<T, WalkerError>;

/// Result type alias for EnumerateError
pub type EnumerateResult<T> = std::result::Result<T, EnumerateError>;

/// Represents the outcome of processing a single work item
#[derive(Debug)]
pub enum ItemOutcome {
    /// Children enumerated
    Success { leaves: usize, containers: usize },

    /// Skipped due to recoverable error
    Skipped { reason: String },

    /// Failed with error
    Failed { error: EnumerateError },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_enumerate_error_recoverable() {
        let perm_denied = EnumerateError::PermissionDenied {
            node: "/test".into(),
        };
        assert!(perm_denied.is_recoverable());

        let io = EnumerateError::Io {
            node: "/test".into(),
            reason: "device error".into(),
        };
        assert!(!io.is_recoverable());
    }

    #[test]
    fn test_from_io_classification() {
        let err = std::io::Error::from(std::io::ErrorKind::PermissionDenied);
        assert!(matches!(
            EnumerateError::from_io("/locked", &err),
            EnumerateError::PermissionDenied { .. }
        ));

        let err = std::io::Error::from(std::io::ErrorKind::NotFound);
        assert!(matches!(
            EnumerateError::from_io("/gone", &err),
            EnumerateError::NotFound { .. }
        ));

        let err = std::io::Error::new(std::io::ErrorKind::Other, "boom");
        assert!(matches!(
            EnumerateError::from_io("/bad", &err),
            EnumerateError::Io { .. }
        ));
    }

    #[test]
    fn test_error_conversion() {
        let config_err = ConfigError::InvalidWorkerCount { count: 0, max: 512 };
        let walker_err: WalkerError = config_err.into();
        assert!(matches!(walker_err, WalkerError::Config(_)));

        let worker_err = WorkerError::Aborted { id: 2 };
        let walker_err: WalkerError = worker_err.into();
        assert_eq!(walker_err.to_string(), "Worker error: Worker 2 aborted: launch failed");
    }
}
