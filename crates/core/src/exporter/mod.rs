//! Directory tree export.
//!
//! Mirrors an input tree into an output tree. Media files are converted to
//! the target format, other files are copied or skipped, and platform
//! metadata files are ignored.
//!
//! The export walks the input tree twice:
//!
//! 1. **Directory pass**: every directory is created on the output side with
//!    the permission bits of its input counterpart. Nothing runs concurrently
//!    with this pass, so file tasks never race directory creation.
//! 2. **File pass**: every file is classified and a convert or copy task is
//!    submitted to a [`WorkPool`](crate::pool::WorkPool). Submission blocks
//!    while the pool's queue is full.
//!
//! The first failing task halts the export: queued tasks are discarded,
//! running conversions are killed, and [`Exporter::run`] returns
//! [`ExportError::TaskFailed`] with the transcoder's output.
//!
//! # Example
//!
//! ```ignore
//! use audiotree_core::converter::{AudioFormat, FfmpegConverter};
//! use audiotree_core::exporter::{ExportJob, Exporter};
//!
//! let job = ExportJob::new("/music/library", "/media/player", AudioFormat::Mp3)
//!     .with_copy_unknown(true);
//! let exporter = Exporter::new(job, Arc::new(FfmpegConverter::with_defaults()), &cancel)?;
//!
//! let summary = exporter.run().await?;
//! println!("{} converted, {} copied", summary.converted, summary.copied);
//! ```

mod classifier;
mod error;
mod reporter;
mod types;
mod walker;

pub use classifier::TaskClassifier;
pub use error::{ExportError, TaskError};
pub use types::{EntryKind, ExportJob, ExportSummary};
pub use walker::Exporter;
