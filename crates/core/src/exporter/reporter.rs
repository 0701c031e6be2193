//! First-failure reporting for export tasks.

use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::error;

use super::error::{ExportError, TaskError};

/// A recorded task failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct TaskFailure {
    pub path: PathBuf,
    pub reason: String,
    pub output: Option<String>,
}

impl From<TaskFailure> for ExportError {
    fn from(failure: TaskFailure) -> Self {
        ExportError::TaskFailed {
            path: failure.path,
            reason: failure.reason,
            output: failure.output,
        }
    }
}

/// Logs task failures and halts the export on the first one.
#[derive(Debug)]
pub(crate) struct FailureReporter {
    cancel: CancellationToken,
    first: Mutex<Option<TaskFailure>>,
}

impl FailureReporter {
    /// Reports into `cancel`, which is cancelled on the first failure.
    pub fn new(cancel: CancellationToken) -> Self {
        Self {
            cancel,
            first: Mutex::new(None),
        }
    }

    /// Logs `err` for `path`, records it if first, and halts the export.
    pub fn report(&self, path: &Path, err: &TaskError) {
        error!("Failed to export {}: {}", path.display(), err);
        if let Some(output) = err.output() {
            error!(
                "=== Start Output {:?} ===\n{}\n=== End Output {:?} ===",
                path, output, path
            );
        }

        {
            let mut first = self.first.lock().unwrap_or_else(|e| e.into_inner());
            if first.is_none() {
                *first = Some(TaskFailure {
                    path: path.to_path_buf(),
                    reason: err.to_string(),
                    output: err.output().map(str::to_string),
                });
            }
        }
        self.cancel.cancel();
    }

    /// Takes the first recorded failure.
    pub fn take(&self) -> Option<TaskFailure> {
        self.first.lock().unwrap_or_else(|e| e.into_inner()).take()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::converter::ConverterError;

    #[test]
    fn test_first_failure_wins_and_cancels() {
        let token = CancellationToken::new();
        let reporter = FailureReporter::new(token.clone());

        reporter.report(
            Path::new("a.flac"),
            &ConverterError::conversion_failed("exit 1", "first").into(),
        );
        reporter.report(
            Path::new("b.flac"),
            &ConverterError::conversion_failed("exit 1", "second").into(),
        );

        assert!(token.is_cancelled());
        let failure = reporter.take().unwrap();
        assert_eq!(failure.path, PathBuf::from("a.flac"));
        assert_eq!(failure.output.as_deref(), Some("first"));
        assert!(reporter.take().is_none());

        let err: ExportError = failure.into();
        assert_eq!(err.output(), Some("first"));
    }
}
