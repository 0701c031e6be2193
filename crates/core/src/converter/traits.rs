//! Trait definitions for the converter module.

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use super::error::ConverterError;
use super::types::{ConversionJob, ConversionResult, CoverArtJob, INPUT_EXTENSIONS};

/// A transcoder invoked once per media file.
///
/// Implementations observe `cancel` and stop the run when it fires.
#[async_trait]
pub trait Converter: Send + Sync {
    /// Returns the name of this converter implementation.
    fn name(&self) -> &str;

    /// Converts one file, returning the transcoder's captured output.
    async fn convert(
        &self,
        cancel: &CancellationToken,
        job: ConversionJob,
    ) -> Result<ConversionResult, ConverterError>;

    /// Extracts embedded cover art from one file.
    async fn extract_cover_art(
        &self,
        cancel: &CancellationToken,
        job: CoverArtJob,
    ) -> Result<ConversionResult, ConverterError>;

    /// Validates that the converter is properly configured and ready.
    async fn validate(&self) -> Result<(), ConverterError>;

    /// Extensions this converter accepts as input, without the dot.
    fn supported_input_extensions(&self) -> &[&str] {
        INPUT_EXTENSIONS
    }
}
