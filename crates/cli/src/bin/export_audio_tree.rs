//! Exports a tree of audio files into another format.

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use audiotree_cli::{interrupt_token, logging::init_logging, options::ExportArgs};
use audiotree_core::{
    load_config, validate_config, validate_roots, Converter, ExportJob, Exporter,
    FfmpegConverter,
};

#[tokio::main]
async fn main() {
    if let Err(e) = run(interrupt_token()).await {
        error!("Fatal error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run(cancel: CancellationToken) -> Result<()> {
    let args = ExportArgs::parse();
    init_logging(&args.log)?;

    let mut config = load_config(args.config.as_deref()).context("Failed to load configuration")?;
    args.apply(&mut config);
    validate_config(&config).context("Configuration validation failed")?;
    let (input, output) = validate_roots(&args.input, &args.output)?;

    let converter = Arc::new(FfmpegConverter::new(config.converter.clone()));
    converter
        .validate()
        .await
        .context("FFmpeg is not usable")?;

    let job = ExportJob::from_config(&config, input, output);
    info!(
        "Exporting {} to {} as {}",
        job.input_root.display(),
        job.output_root.display(),
        job.format
    );

    let exporter = Exporter::new(job, converter, &cancel)?;
    let summary = exporter.run().await?;
    info!(
        "Converted {} files, copied {} files ({} bytes), skipped {} files",
        summary.converted, summary.copied, summary.bytes_copied, summary.skipped
    );
    Ok(())
}
