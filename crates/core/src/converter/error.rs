//! Error types for the converter module.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur during conversion.
#[derive(Debug, Error)]
pub enum ConverterError {
    /// FFmpeg binary not found.
    #[error("FFmpeg not found at path: {path}")]
    FfmpegNotFound { path: PathBuf },

    /// Requested output format is not supported.
    #[error("Unsupported format: {format}")]
    UnsupportedFormat { format: String },

    /// The transcoder ran and failed.
    #[error("Conversion failed: {reason}")]
    ConversionFailed { reason: String, output: String },

    /// Conversion timed out.
    #[error("Conversion timed out after {timeout_secs} seconds")]
    Timeout { timeout_secs: u64 },

    /// I/O error while running the transcoder.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Job was cancelled.
    #[error("Conversion cancelled")]
    Cancelled,
}

impl ConverterError {
    /// Creates a new conversion failed error carrying the captured output.
    pub fn conversion_failed(reason: impl Into<String>, output: impl Into<String>) -> Self {
        Self::ConversionFailed {
            reason: reason.into(),
            output: output.into(),
        }
    }

    /// Captured transcoder output, when the transcoder got to run.
    pub fn output(&self) -> Option<&str> {
        match self {
            Self::ConversionFailed { output, .. } => Some(output),
            _ => None,
        }
    }

    /// Whether the conversion was stopped by cancellation.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}
