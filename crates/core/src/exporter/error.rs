//! Error types for the exporter module.

use std::path::PathBuf;
use thiserror::Error;

use crate::converter::ConverterError;
use crate::filesystem::FsError;
use crate::pool::PoolError;

/// Errors that end an export.
#[derive(Debug, Error)]
pub enum ExportError {
    /// Walking the input tree or creating output directories failed.
    #[error("Filesystem error: {0}")]
    Fs(#[from] FsError),

    /// The work pool was driven out of order.
    #[error("Work pool error: {0}")]
    Pool(#[from] PoolError),

    /// A copy or conversion failed. The first failure ends the export.
    #[error("Export of {path} failed: {reason}")]
    TaskFailed {
        path: PathBuf,
        reason: String,
        output: Option<String>,
    },

    /// The export was interrupted.
    #[error("Export cancelled")]
    Cancelled,
}

impl ExportError {
    /// Captured transcoder output of a failed conversion.
    pub fn output(&self) -> Option<&str> {
        match self {
            Self::TaskFailed { output, .. } => output.as_deref(),
            _ => None,
        }
    }

    /// Whether the error signals a lifecycle bug rather than a runtime failure.
    pub fn is_precondition_violation(&self) -> bool {
        matches!(self, Self::Pool(e) if e.is_precondition_violation())
    }
}

/// Failure of a single export task.
#[derive(Debug, Error)]
pub enum TaskError {
    #[error(transparent)]
    Fs(#[from] FsError),

    #[error(transparent)]
    Converter(#[from] ConverterError),
}

impl TaskError {
    /// Captured transcoder output, if the transcoder ran.
    pub fn output(&self) -> Option<&str> {
        match self {
            Self::Converter(e) => e.output(),
            Self::Fs(_) => None,
        }
    }

    /// Whether the task was stopped by cancellation.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Converter(e) if e.is_cancelled())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_task_error_output() {
        let failed: TaskError =
            ConverterError::conversion_failed("exit 1", "moov atom not found").into();
        assert_eq!(failed.output(), Some("moov atom not found"));
        assert!(!failed.is_cancelled());

        let cancelled: TaskError = ConverterError::Cancelled.into();
        assert!(cancelled.is_cancelled());
    }

    #[test]
    fn test_precondition_violation() {
        assert!(ExportError::Pool(PoolError::NotRunning).is_precondition_violation());
        assert!(!ExportError::Pool(PoolError::Cancelled).is_precondition_violation());
        assert!(!ExportError::Cancelled.is_precondition_violation());
    }
}
