//! Mock converter for testing.

use async_trait::async_trait;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;

use crate::converter::{
    ConversionJob, ConversionResult, Converter, ConverterError, CoverArtJob,
};

/// A recorded conversion job for test assertions.
#[derive(Debug, Clone)]
pub struct RecordedConversion {
    /// The job that was submitted.
    pub job: ConversionJob,
    /// Whether the conversion succeeded.
    pub success: bool,
    /// Whether the output directory existed when the conversion started.
    pub output_dir_existed: bool,
}

/// Mock implementation of the Converter trait.
///
/// Provides controllable behavior for testing:
/// - Track conversion jobs for assertions
/// - Write a synthetic output file per conversion
/// - Fail conversions of chosen inputs with canned output
/// - Simulate slow conversions that observe cancellation
///
/// # Example
///
/// ```rust,ignore
/// use audiotree_core::testing::MockConverter;
///
/// let converter = MockConverter::new();
/// converter.fail_on("b.wav", "Invalid data found when processing input").await;
///
/// let result = converter.convert(&cancel, job).await?;
///
/// // Check what was converted
/// let conversions = converter.recorded_conversions().await;
/// assert_eq!(conversions.len(), 1);
/// ```
#[derive(Debug, Clone, Default)]
pub struct MockConverter {
    /// Recorded conversions.
    conversions: Arc<RwLock<Vec<RecordedConversion>>>,
    /// Recorded cover art extractions.
    extractions: Arc<RwLock<Vec<CoverArtJob>>>,
    /// Canned failure output by input path suffix.
    failures: Arc<RwLock<HashMap<PathBuf, String>>>,
    /// If set, the next operation will fail with this error.
    next_error: Arc<RwLock<Option<ConverterError>>>,
    /// Simulated conversion duration in milliseconds.
    conversion_duration_ms: Arc<RwLock<u64>>,
}

impl MockConverter {
    /// Create a new mock converter.
    pub fn new() -> Self {
        Self::default()
    }

    /// Get all recorded conversions.
    pub async fn recorded_conversions(&self) -> Vec<RecordedConversion> {
        self.conversions.read().await.clone()
    }

    /// Get all recorded cover art extractions.
    pub async fn recorded_extractions(&self) -> Vec<CoverArtJob> {
        self.extractions.read().await.clone()
    }

    /// Get the number of conversions attempted.
    pub async fn conversion_count(&self) -> usize {
        self.conversions.read().await.len()
    }

    /// Make conversions of any input ending with `suffix` fail with `output`.
    pub async fn fail_on(&self, suffix: impl AsRef<Path>, output: impl Into<String>) {
        self.failures
            .write()
            .await
            .insert(suffix.as_ref().to_path_buf(), output.into());
    }

    /// Configure the next operation to fail with the given error.
    pub async fn set_next_error(&self, error: ConverterError) {
        *self.next_error.write().await = Some(error);
    }

    /// Set the simulated conversion duration.
    pub async fn set_conversion_duration(&self, duration: Duration) {
        *self.conversion_duration_ms.write().await = duration.as_millis() as u64;
    }

    /// Take the next error if set.
    async fn take_error(&self) -> Option<ConverterError> {
        self.next_error.write().await.take()
    }

    async fn canned_failure(&self, input: &Path) -> Option<String> {
        self.failures
            .read()
            .await
            .iter()
            .find(|(suffix, _)| input.ends_with(suffix))
            .map(|(_, output)| output.clone())
    }

    async fn simulate_work(&self, cancel: &CancellationToken) -> Result<u64, ConverterError> {
        let duration_ms = *self.conversion_duration_ms.read().await;
        if duration_ms > 0 {
            tokio::select! {
                _ = cancel.cancelled() => return Err(ConverterError::Cancelled),
                _ = tokio::time::sleep(Duration::from_millis(duration_ms)) => {}
            }
        }
        Ok(duration_ms)
    }

    async fn record(&self, job: ConversionJob, success: bool, output_dir_existed: bool) {
        self.conversions.write().await.push(RecordedConversion {
            job,
            success,
            output_dir_existed,
        });
    }
}

async fn parent_exists(path: &Path) -> bool {
    match path.parent() {
        Some(parent) => tokio::fs::metadata(parent)
            .await
            .map(|meta| meta.is_dir())
            .unwrap_or(false),
        None => false,
    }
}

#[async_trait]
impl Converter for MockConverter {
    fn name(&self) -> &str {
        "mock"
    }

    async fn convert(
        &self,
        cancel: &CancellationToken,
        job: ConversionJob,
    ) -> Result<ConversionResult, ConverterError> {
        let output_dir_existed = parent_exists(&job.output_path).await;

        if let Some(err) = self.take_error().await {
            self.record(job, false, output_dir_existed).await;
            return Err(err);
        }

        if let Some(output) = self.canned_failure(&job.input_path).await {
            self.record(job, false, output_dir_existed).await;
            return Err(ConverterError::conversion_failed("exit status: 1", output));
        }

        let duration_ms = match self.simulate_work(cancel).await {
            Ok(duration_ms) => duration_ms,
            Err(e) => {
                self.record(job, false, output_dir_existed).await;
                return Err(e);
            }
        };

        let content = format!("converted from {}", job.input_path.display());
        tokio::fs::write(&job.output_path, content).await?;
        self.record(job.clone(), true, output_dir_existed).await;

        Ok(ConversionResult {
            output_path: job.output_path,
            output: format!("mock: {}", job.input_path.display()),
            duration_ms,
        })
    }

    async fn extract_cover_art(
        &self,
        cancel: &CancellationToken,
        job: CoverArtJob,
    ) -> Result<ConversionResult, ConverterError> {
        if let Some(err) = self.take_error().await {
            return Err(err);
        }
        let duration_ms = self.simulate_work(cancel).await?;

        tokio::fs::write(&job.output_path, b"cover").await?;
        self.extractions.write().await.push(job.clone());

        Ok(ConversionResult {
            output_path: job.output_path,
            output: String::new(),
            duration_ms,
        })
    }

    async fn validate(&self) -> Result<(), ConverterError> {
        if let Some(err) = self.take_error().await {
            return Err(err);
        }
        Ok(())
    }
}
