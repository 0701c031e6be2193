//! Single-file conversion shared by the `to_<format>` tools.

use std::time::Instant;

use anyhow::{Context, Result};
use chrono::Local;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use audiotree_core::{
    load_config, validate_config, AudioFormat, Config, ConversionJob, ConversionParams,
    Converter, FfmpegConverter, OverwritePolicy,
};

use crate::logging::init_logging;
use crate::options::{ensure_distinct, ConvertArgs};

const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Parses the process arguments and converts one file to `format`.
pub async fn run(format: AudioFormat, cancel: CancellationToken) -> Result<()> {
    let args = ConvertArgs::parse_for(format);
    init_logging(&args.log)?;
    ensure_distinct(&args.input, &args.output)?;

    let config = load_config(args.config.as_deref()).context("Failed to load configuration")?;
    validate_config(&config).context("Configuration validation failed")?;

    if !format.matches(&args.output) {
        warn!(
            "{} does not have a .{} extension",
            args.output.display(),
            format.extension()
        );
    }

    let job = conversion_job(&args, &config, format);
    let converter = FfmpegConverter::new(config.converter.with_attached_stdio(true));

    let clock = Instant::now();
    info!("Started conversion at {}", Local::now().format(TIME_FORMAT));
    let result = converter
        .convert(&cancel, job)
        .await
        .with_context(|| format!("Failed to convert {}", args.input.display()))?;
    info!(
        "Finished conversion at {} ({:.2?})",
        Local::now().format(TIME_FORMAT),
        clock.elapsed()
    );
    debug!("Wrote {}", result.output_path.display());
    Ok(())
}

/// Builds the job: flags over configuration over the format's defaults.
fn conversion_job(args: &ConvertArgs, config: &Config, format: AudioFormat) -> ConversionJob {
    let mut params: ConversionParams = config.conversion.clone();
    args.conversion.apply(&mut params);

    ConversionJob {
        input_path: args.input.clone(),
        output_path: args.output.clone(),
        params: params.with_defaults(&format.default_params()),
        overwrite: args.overwrite.policy().unwrap_or(OverwritePolicy::Ask),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use std::path::PathBuf;

    fn parse(argv: &[&str]) -> ConvertArgs {
        ConvertArgs::try_parse_from(argv).unwrap()
    }

    #[test]
    fn test_job_uses_format_defaults() {
        let args = parse(&["to_mp3", "in.flac", "out.mp3"]);

        let job = conversion_job(&args, &Config::default(), AudioFormat::Mp3);

        assert_eq!(job.input_path, PathBuf::from("in.flac"));
        assert_eq!(job.output_path, PathBuf::from("out.mp3"));
        assert_eq!(job.params, AudioFormat::Mp3.default_params());
        assert_eq!(job.overwrite, OverwritePolicy::Ask);
    }

    #[test]
    fn test_flags_win_over_config() {
        let args = parse(&["to_flac", "-c", "alac", "-m", "-y", "in.wav", "out.flac"]);
        let mut config = Config::default();
        config.conversion.codec = Some("flac".to_string());
        config.conversion.channels = Some(2);
        config.conversion.bitrate = Some("900k".to_string());

        let job = conversion_job(&args, &config, AudioFormat::Flac);

        assert_eq!(job.params.codec.as_deref(), Some("alac"));
        assert_eq!(job.params.channels, Some(1));
        assert_eq!(job.params.bitrate.as_deref(), Some("900k"));
        assert_eq!(job.overwrite, OverwritePolicy::Overwrite);
    }
}
