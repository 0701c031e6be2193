//! Two-pass tree export.

use chrono::Local;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace};

use super::classifier::TaskClassifier;
use super::error::{ExportError, TaskError};
use super::reporter::FailureReporter;
use super::types::{EntryKind, ExportJob, ExportStats, ExportSummary};
use crate::converter::{ConversionJob, Converter};
use crate::filesystem::{copy_file, PathCleaner, RootedFs};
use crate::pool::{Task, WorkPool};

/// How often pool status is logged while files are processed.
const STATUS_INTERVAL: Duration = Duration::from_secs(30);

const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// State shared by the walker and every task it submits.
struct ExportContext<C> {
    job: ExportJob,
    converter: Arc<C>,
    classifier: TaskClassifier,
    input: RootedFs,
    output: RootedFs,
    cleaner: Option<PathCleaner>,
    cancel: CancellationToken,
    failures: FailureReporter,
    stats: ExportStats,
}

/// Mirrors an input tree into an output tree, converting media files.
///
/// Runs in two passes. The first creates every output directory before any
/// file task exists. The second classifies files and feeds the work pool.
pub struct Exporter<C>
where
    C: Converter + 'static,
{
    ctx: Arc<ExportContext<C>>,
    pool: Arc<WorkPool>,
}

impl<C> Exporter<C>
where
    C: Converter + 'static,
{
    /// Creates an exporter. Cancelling `cancel` interrupts the export.
    pub fn new(
        job: ExportJob,
        converter: Arc<C>,
        cancel: &CancellationToken,
    ) -> Result<Self, ExportError> {
        let input = RootedFs::new(&job.input_root)?;
        let output = RootedFs::new(&job.output_root)?;
        let cancel = cancel.child_token();
        let pool = WorkPool::new(cancel.clone(), job.max_jobs, job.max_queue);

        let ctx = ExportContext {
            classifier: TaskClassifier::new(converter.supported_input_extensions()),
            cleaner: job.clean_paths.as_deref().map(PathCleaner::new),
            failures: FailureReporter::new(cancel.clone()),
            stats: ExportStats::default(),
            job,
            converter,
            input,
            output,
            cancel,
        };

        Ok(Self {
            ctx: Arc::new(ctx),
            pool: Arc::new(pool),
        })
    }

    /// The pool executing file tasks.
    pub fn pool(&self) -> &WorkPool {
        &self.pool
    }

    /// Runs the export to completion.
    ///
    /// The first failed task halts the export and is returned as
    /// [`ExportError::TaskFailed`].
    pub async fn run(&self) -> Result<ExportSummary, ExportError> {
        let clock = Instant::now();
        info!("Started export at {}", Local::now().format(TIME_FORMAT));

        let result = self.export().await;

        info!(
            "Finished export at {} ({:.2?})",
            Local::now().format(TIME_FORMAT),
            clock.elapsed()
        );
        result
    }

    async fn export(&self) -> Result<ExportSummary, ExportError> {
        self.create_directories().await?;

        self.pool.start().await?;
        let status = self.spawn_status_logger();

        let outcome = match self.submit_files().await {
            Ok(()) => self.pool.wait().await.map_err(ExportError::from),
            Err(e) => Err(e),
        };
        status.abort();

        // Tasks still queued after a failure are discarded here.
        self.pool.stop().await?;

        if let Some(failure) = self.ctx.failures.take() {
            return Err(failure.into());
        }
        if self.ctx.cancel.is_cancelled() {
            return Err(ExportError::Cancelled);
        }
        outcome?;

        let summary = self.ctx.stats.summary();
        info!(
            converted = summary.converted,
            copied = summary.copied,
            skipped = summary.skipped,
            bytes_copied = summary.bytes_copied,
            "Export complete"
        );
        Ok(summary)
    }

    /// First pass: mirror every directory, with its permission bits.
    async fn create_directories(&self) -> Result<(), ExportError> {
        let ctx = &self.ctx;
        let mut walk = ctx.input.walk();
        let mut created = 0usize;

        while let Some(entry) = walk.recv().await {
            let entry = entry?;
            if ctx.cancel.is_cancelled() {
                return Err(ExportError::Cancelled);
            }
            if ctx.classifier.classify(&entry.path, entry.is_dir) != EntryKind::Directory {
                continue;
            }

            let mode = ctx.input.mode(&entry.path).await?;
            let target = ctx.output_path(&entry.path);
            ctx.output.create_dir_all(&target, mode).await?;
            trace!("Created directory {}", target.display());
            created += 1;
        }

        info!("Created {} output directories", created);
        Ok(())
    }

    /// Second pass: submit a task for every file that needs one.
    async fn submit_files(&self) -> Result<(), ExportError> {
        let ctx = &self.ctx;
        let mut walk = ctx.input.walk();

        while let Some(entry) = walk.recv().await {
            let entry = entry?;
            match ctx.classifier.classify(&entry.path, entry.is_dir) {
                EntryKind::Directory => {}
                EntryKind::Trash => {
                    trace!("Skipping trash file {}", entry.path.display());
                    ctx.stats.record_skipped();
                }
                EntryKind::Media => {
                    self.pool.add(convert_task(ctx, entry.path)).await?;
                }
                EntryKind::Other if ctx.job.copy_unknown => {
                    self.pool.add(copy_task(ctx, entry.path)).await?;
                }
                EntryKind::Other => {
                    debug!("Skipping unknown file {}", entry.path.display());
                    ctx.stats.record_skipped();
                }
            }
        }
        Ok(())
    }

    fn spawn_status_logger(&self) -> JoinHandle<()> {
        let pool = Arc::clone(&self.pool);
        let cancel = self.ctx.cancel.clone();

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(STATUS_INTERVAL);
            // The first tick completes immediately.
            ticker.tick().await;
            loop {
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    _ = ticker.tick() => {
                        info!(
                            "Work pool status: size={} limit={} remaining={} full={:.1}%",
                            pool.size(),
                            pool.limit(),
                            pool.remaining(),
                            pool.percent_full()
                        );
                    }
                }
            }
        })
    }
}

fn convert_task<C: Converter + 'static>(ctx: &Arc<ExportContext<C>>, path: PathBuf) -> Task {
    let ctx = Arc::clone(ctx);
    Box::pin(async move {
        if let Err(e) = ctx.convert(&path).await {
            ctx.fail(&path, e);
        }
    })
}

fn copy_task<C: Converter + 'static>(ctx: &Arc<ExportContext<C>>, path: PathBuf) -> Task {
    let ctx = Arc::clone(ctx);
    Box::pin(async move {
        if let Err(e) = ctx.copy(&path).await {
            ctx.fail(&path, e);
        }
    })
}

impl<C> ExportContext<C>
where
    C: Converter + 'static,
{
    /// Output-side path for a root-relative input path.
    fn output_path(&self, rel: &Path) -> PathBuf {
        match self.cleaner {
            Some(ref cleaner) => cleaner.clean_path(rel),
            None => rel.to_path_buf(),
        }
    }

    async fn convert(&self, rel: &Path) -> Result<(), TaskError> {
        let format = self.job.format;
        if format.matches(rel) {
            debug!("{} is already {}, copying", rel.display(), format);
            return self.copy(rel).await;
        }

        let target = self.output_path(&rel.with_extension(format.extension()));
        if self.job.overwrite.is_no_clobber() && self.output.exists(&target).await? {
            debug!("Not overwriting {}", target.display());
            self.stats.record_skipped();
            return Ok(());
        }

        let job = ConversionJob {
            input_path: self.input.resolve(rel)?,
            output_path: self.output.resolve(&target)?,
            params: self.job.params.clone(),
            overwrite: self.job.overwrite,
        };

        debug!("Converting {} to {}", rel.display(), target.display());
        let result = self.converter.convert(&self.cancel, job).await?;
        self.stats.record_converted();
        debug!(
            "Converted {} in {} ms\n=== Start Output {:?} ===\n{}\n=== End Output {:?} ===",
            rel.display(),
            result.duration_ms,
            rel,
            result.output,
            rel
        );
        Ok(())
    }

    async fn copy(&self, rel: &Path) -> Result<(), TaskError> {
        let target = self.output_path(rel);
        if self.job.overwrite.is_no_clobber() && self.output.exists(&target).await? {
            debug!("Not overwriting {}", target.display());
            self.stats.record_skipped();
            return Ok(());
        }

        let bytes = copy_file(&self.input, rel, &self.output, &target).await?;
        self.stats.record_copied(bytes);
        debug!("Copied {} ({} bytes)", rel.display(), bytes);
        Ok(())
    }

    fn fail(&self, rel: &Path, err: TaskError) {
        if err.is_cancelled() {
            debug!("Export of {} cancelled", rel.display());
            return;
        }
        self.failures.report(rel, &err);
    }
}
