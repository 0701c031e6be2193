//! Error types for the filesystem module.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while accessing a rooted tree.
#[derive(Debug, Error)]
pub enum FsError {
    /// Path is absolute or climbs out of the root.
    #[error("Invalid path {path}: {reason}")]
    InvalidPath { path: PathBuf, reason: String },

    /// Path does not exist.
    #[error("Not found: {path}")]
    NotFound { path: PathBuf },

    /// Failed to read metadata.
    #[error("Failed to stat {path}")]
    StatFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failed to create a directory.
    #[error("Failed to create directory: {path}")]
    DirectoryCreationFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failed to open a file for reading.
    #[error("Failed to open {path}")]
    OpenFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failed to create a file for writing.
    #[error("Failed to create {path}")]
    CreateFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failed to copy file.
    #[error("Failed to copy file from {source} to {destination}")]
    CopyFailed {
        source: PathBuf,
        destination: PathBuf,
        #[source]
        error: std::io::Error,
    },

    /// Traversal failed.
    #[error("Failed to walk {path}")]
    WalkFailed {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl FsError {
    /// Creates an invalid path error.
    pub fn invalid_path(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::InvalidPath {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Creates a copy failed error.
    pub fn copy_failed(source: PathBuf, destination: PathBuf, error: std::io::Error) -> Self {
        Self::CopyFailed {
            source,
            destination,
            error,
        }
    }

    /// Maps a stat error, keeping not-found distinct.
    pub(crate) fn stat(path: PathBuf, source: std::io::Error) -> Self {
        if source.kind() == std::io::ErrorKind::NotFound {
            Self::NotFound { path }
        } else {
            Self::StatFailed { path, source }
        }
    }

    /// Whether the error means the path simply does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}
