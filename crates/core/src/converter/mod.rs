//! Converter module for transcoding audio files.
//!
//! This module provides the `Converter` trait and an implementation that runs
//! FFmpeg once per file.
//!
//! # Features
//!
//! - Audio transcoding to FLAC, AAC (m4a/m4r) and MP3 with per-format defaults
//! - Metadata carried over from the source
//! - Cover art copied, dropped, or extracted to an image file
//! - Cancellation and timeouts that kill the running process
//!
//! # Example
//!
//! ```ignore
//! use audiotree_core::converter::{
//!     AudioFormat, ConversionJob, ConversionParams, Converter, FfmpegConverter, OverwritePolicy,
//! };
//!
//! let converter = FfmpegConverter::with_defaults();
//!
//! // Validate ffmpeg is available
//! converter.validate().await?;
//!
//! let job = ConversionJob {
//!     input_path: PathBuf::from("/music/track.flac"),
//!     output_path: PathBuf::from("/export/track.mp3"),
//!     params: ConversionParams::default().with_defaults(&AudioFormat::Mp3.default_params()),
//!     overwrite: OverwritePolicy::Never,
//! };
//!
//! let result = converter.convert(&CancellationToken::new(), job).await?;
//! println!("Converted in {} ms", result.duration_ms);
//! ```

mod config;
mod error;
mod ffmpeg;
mod traits;
mod types;

pub use config::ConverterConfig;
pub use error::ConverterError;
pub use ffmpeg::FfmpegConverter;
pub use traits::Converter;
pub use types::{
    extension_of, AudioFormat, ConversionJob, ConversionParams, ConversionResult, CoverArt,
    CoverArtJob, OverwritePolicy, DEFAULT_SAMPLE_RATE_HZ, INPUT_EXTENSIONS,
};
