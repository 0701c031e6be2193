//! Error types for the work pool.

use thiserror::Error;

/// Errors returned by [`WorkPool`](super::WorkPool) operations.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum PoolError {
    /// The pool has not been started, or has been stopped.
    #[error("work pool is not running")]
    NotRunning,

    /// `start` was called on a pool that is already running.
    #[error("work pool is already running")]
    AlreadyRunning,

    /// The pool's cancellation token fired while a task was waiting for queue space.
    #[error("work pool was cancelled")]
    Cancelled,
}

impl PoolError {
    /// Whether this error signals a lifecycle sequencing bug in the caller
    /// rather than a runtime condition.
    pub fn is_precondition_violation(&self) -> bool {
        matches!(self, Self::NotRunning | Self::AlreadyRunning)
    }
}
