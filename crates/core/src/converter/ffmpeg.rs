//! FFmpeg-based converter implementation.

use async_trait::async_trait;
use std::ffi::OsString;
use std::path::Path;
use std::process::{Output, Stdio};
use std::time::Instant;
use tokio::process::Command;
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use super::config::ConverterConfig;
use super::error::ConverterError;
use super::traits::Converter;
use super::types::{ConversionJob, ConversionResult, CoverArt, CoverArtJob, OverwritePolicy};

/// FFmpeg-based converter implementation.
pub struct FfmpegConverter {
    config: ConverterConfig,
}

impl FfmpegConverter {
    /// Creates a new FFmpeg converter with the given configuration.
    pub fn new(config: ConverterConfig) -> Self {
        Self { config }
    }

    /// Creates a converter with default configuration.
    pub fn with_defaults() -> Self {
        Self::new(ConverterConfig::default())
    }

    /// Builds ffmpeg arguments for an audio conversion.
    fn build_convert_args(&self, job: &ConversionJob) -> Vec<OsString> {
        let mut args = self.input_args(&job.input_path);

        // Keep tags from the source.
        args.extend(["-map_metadata".into(), "0".into()]);

        match job.params.cover_art {
            CoverArt::Copy => args.extend(["-c:v".into(), "copy".into()]),
            CoverArt::Drop => args.push("-vn".into()),
        }

        push_overwrite(&mut args, job.overwrite);

        let params = &job.params;
        if let Some(ref codec) = params.codec {
            args.extend(["-c:a".into(), codec.into()]);
        }
        if let Some(ref bitrate) = params.bitrate {
            args.extend(["-b:a".into(), bitrate.into()]);
        }
        if let Some(rate) = params.sample_rate_hz {
            args.extend(["-ar".into(), rate.to_string().into()]);
        }
        if let Some(channels) = params.channels {
            args.extend(["-ac".into(), channels.to_string().into()]);
        }

        self.finish_args(&mut args, &job.output_path);
        args
    }

    /// Builds ffmpeg arguments for cover art extraction.
    fn build_cover_art_args(&self, job: &CoverArtJob) -> Vec<OsString> {
        let mut args = self.input_args(&job.input_path);

        // Select picture streams, then drop the ones that are real video.
        args.extend(["-map".into(), "0:v".into(), "-map".into(), "-0:V".into()]);
        if let Some(ref codec) = job.codec {
            args.extend(["-c".into(), codec.into()]);
        }
        if let Some(ref scale) = job.scale {
            args.extend(["-s".into(), scale.into()]);
        }
        push_overwrite(&mut args, job.overwrite);

        self.finish_args(&mut args, &job.output_path);
        args
    }

    /// Paths are passed as they are, so names need not be valid Unicode.
    fn input_args(&self, input_path: &Path) -> Vec<OsString> {
        let mut args = Vec::new();
        // Only an attached ffmpeg may prompt on the terminal.
        if !self.config.attach_stdio {
            args.push("-nostdin".into());
        }
        args.extend(["-i".into(), input_path.as_os_str().to_os_string()]);
        args
    }

    fn finish_args(&self, args: &mut Vec<OsString>, output_path: &Path) {
        args.extend(["-loglevel".into(), (&self.config.ffmpeg_log_level).into()]);
        args.extend(self.config.extra_ffmpeg_args.iter().map(OsString::from));
        args.push(output_path.as_os_str().to_os_string());
    }

    /// Runs ffmpeg with `args`, honoring cancellation and the timeout.
    async fn run(
        &self,
        cancel: &CancellationToken,
        args: Vec<OsString>,
        output_path: &Path,
    ) -> Result<ConversionResult, ConverterError> {
        if cancel.is_cancelled() {
            return Err(ConverterError::Cancelled);
        }

        let start = Instant::now();
        let mut command = Command::new(&self.config.ffmpeg_path);
        command.args(&args).kill_on_drop(true);
        if self.config.attach_stdio {
            command
                .stdin(Stdio::inherit())
                .stdout(Stdio::inherit())
                .stderr(Stdio::inherit());
            info!(
                "Running: {} {}",
                self.config.ffmpeg_path.display(),
                display_args(&args)
            );
        } else {
            command
                .stdin(Stdio::null())
                .stdout(Stdio::piped())
                .stderr(Stdio::piped());
            debug!(
                "Running in background: {} {}",
                self.config.ffmpeg_path.display(),
                display_args(&args)
            );
        }

        let child = command.spawn().map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ConverterError::FfmpegNotFound {
                    path: self.config.ffmpeg_path.clone(),
                }
            } else {
                ConverterError::Io(e)
            }
        })?;

        // Dropping the child on cancellation or timeout kills it.
        let timeout_secs = self.config.timeout_secs;
        let finished = async move {
            match self.config.timeout() {
                Some(limit) => timeout(limit, child.wait_with_output())
                    .await
                    .map_err(|_| ConverterError::Timeout { timeout_secs })?
                    .map_err(ConverterError::Io),
                None => child.wait_with_output().await.map_err(ConverterError::Io),
            }
        };

        let output = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(ConverterError::Cancelled),
            output = finished => output?,
        };

        let combined = combined_output(&output);
        if !output.status.success() {
            return Err(ConverterError::conversion_failed(
                format!("ffmpeg exited with {}", output.status),
                combined,
            ));
        }

        Ok(ConversionResult {
            output_path: output_path.to_path_buf(),
            output: combined,
            duration_ms: start.elapsed().as_millis() as u64,
        })
    }
}

fn push_overwrite(args: &mut Vec<OsString>, policy: OverwritePolicy) {
    if let Some(flag) = policy.ffmpeg_flag() {
        args.push(flag.into());
    }
}

fn display_args(args: &[OsString]) -> String {
    args.iter()
        .map(|arg| arg.to_string_lossy())
        .collect::<Vec<_>>()
        .join(" ")
}

fn combined_output(output: &Output) -> String {
    let mut combined = String::from_utf8_lossy(&output.stdout).into_owned();
    combined.push_str(&String::from_utf8_lossy(&output.stderr));
    combined
}

#[async_trait]
impl Converter for FfmpegConverter {
    fn name(&self) -> &str {
        "ffmpeg"
    }

    async fn convert(
        &self,
        cancel: &CancellationToken,
        job: ConversionJob,
    ) -> Result<ConversionResult, ConverterError> {
        let args = self.build_convert_args(&job);
        self.run(cancel, args, &job.output_path).await
    }

    async fn extract_cover_art(
        &self,
        cancel: &CancellationToken,
        job: CoverArtJob,
    ) -> Result<ConversionResult, ConverterError> {
        let args = self.build_cover_art_args(&job);
        self.run(cancel, args, &job.output_path).await
    }

    async fn validate(&self) -> Result<(), ConverterError> {
        let result = Command::new(&self.config.ffmpeg_path)
            .arg("-version")
            .stdin(Stdio::null())
            .output()
            .await;

        match result {
            Ok(_) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(ConverterError::FfmpegNotFound {
                    path: self.config.ffmpeg_path.clone(),
                })
            }
            Err(e) => Err(ConverterError::Io(e)),
        }
    }
}
