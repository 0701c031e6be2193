//! Types for the exporter module.

use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::config::Config;
use crate::converter::{AudioFormat, ConversionParams, OverwritePolicy};

/// What an input tree entry is, for export purposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    /// Mirrored during the directory pass.
    Directory,
    /// Platform metadata. Never copied nor converted.
    Trash,
    /// Recognized media, converted to the target format.
    Media,
    /// Anything else, copied when the policy allows.
    Other,
}

/// One tree export.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportJob {
    /// Absolute root of the tree to read.
    pub input_root: PathBuf,
    /// Absolute root of the tree to write.
    pub output_root: PathBuf,
    /// Target format for media files.
    pub format: AudioFormat,
    /// Copy files that are not media.
    pub copy_unknown: bool,
    /// Policy for existing output files.
    pub overwrite: OverwritePolicy,
    /// Worker limit. 0 uses the CPU count.
    pub max_jobs: usize,
    /// Queue bound. 0 uses max(max_jobs, 100).
    pub max_queue: usize,
    /// Replacement text for reserved characters in output paths.
    pub clean_paths: Option<String>,
    /// Encoder settings passed to every conversion.
    pub params: ConversionParams,
}

impl ExportJob {
    /// Creates a job with the format's default encoder settings.
    pub fn new(
        input_root: impl Into<PathBuf>,
        output_root: impl Into<PathBuf>,
        format: AudioFormat,
    ) -> Self {
        Self {
            input_root: input_root.into(),
            output_root: output_root.into(),
            format,
            copy_unknown: true,
            overwrite: OverwritePolicy::default(),
            max_jobs: 0,
            max_queue: 0,
            clean_paths: None,
            params: format.default_params(),
        }
    }

    /// Creates a job from the effective configuration.
    pub fn from_config(
        config: &Config,
        input_root: impl Into<PathBuf>,
        output_root: impl Into<PathBuf>,
    ) -> Self {
        let export = &config.export;
        Self {
            input_root: input_root.into(),
            output_root: output_root.into(),
            format: export.format,
            copy_unknown: export.copy_unknown,
            overwrite: export.overwrite,
            max_jobs: export.max_jobs,
            max_queue: export.max_queue,
            clean_paths: export.clean_paths.clone().filter(|text| !text.is_empty()),
            params: config.effective_params(),
        }
    }

    /// Sets whether unknown files are copied.
    pub fn with_copy_unknown(mut self, copy_unknown: bool) -> Self {
        self.copy_unknown = copy_unknown;
        self
    }

    /// Sets the overwrite policy.
    pub fn with_overwrite(mut self, overwrite: OverwritePolicy) -> Self {
        self.overwrite = overwrite;
        self
    }

    /// Sets the worker limit and queue bound.
    pub fn with_pool_size(mut self, max_jobs: usize, max_queue: usize) -> Self {
        self.max_jobs = max_jobs;
        self.max_queue = max_queue;
        self
    }

    /// Cleans output paths with `replacement`.
    pub fn with_clean_paths(mut self, replacement: impl Into<String>) -> Self {
        self.clean_paths = Some(replacement.into());
        self
    }
}

/// Counts of what an export did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExportSummary {
    /// Media files converted.
    pub converted: u64,
    /// Files copied, including media already in the target format.
    pub copied: u64,
    /// Files left alone: trash, unknown files, existing destinations.
    pub skipped: u64,
    /// Bytes written by copies.
    pub bytes_copied: u64,
}

/// Live counters shared by export tasks.
#[derive(Debug, Default)]
pub(crate) struct ExportStats {
    converted: AtomicU64,
    copied: AtomicU64,
    skipped: AtomicU64,
    bytes_copied: AtomicU64,
}

impl ExportStats {
    pub fn record_converted(&self) {
        self.converted.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_copied(&self, bytes: u64) {
        self.copied.fetch_add(1, Ordering::Relaxed);
        self.bytes_copied.fetch_add(bytes, Ordering::Relaxed);
    }

    pub fn record_skipped(&self) {
        self.skipped.fetch_add(1, Ordering::Relaxed);
    }

    pub fn summary(&self) -> ExportSummary {
        ExportSummary {
            converted: self.converted.load(Ordering::Relaxed),
            copied: self.copied.load(Ordering::Relaxed),
            skipped: self.skipped.load(Ordering::Relaxed),
            bytes_copied: self.bytes_copied.load(Ordering::Relaxed),
        }
    }
}
