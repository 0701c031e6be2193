//! Extracts cover art from one audio file.

use anyhow::{Context, Result};
use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error};

use audiotree_cli::{
    interrupt_token,
    logging::init_logging,
    options::{ensure_distinct, ExtractArgs},
};
use audiotree_core::{
    load_config, validate_config, Converter, CoverArtJob, FfmpegConverter, OverwritePolicy,
};

#[tokio::main]
async fn main() {
    if let Err(e) = run(interrupt_token()).await {
        error!("Fatal error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run(cancel: CancellationToken) -> Result<()> {
    let args = ExtractArgs::parse();
    init_logging(&args.log)?;
    ensure_distinct(&args.input, &args.output)?;

    let config = load_config(args.config.as_deref()).context("Failed to load configuration")?;
    validate_config(&config).context("Configuration validation failed")?;

    let converter = FfmpegConverter::new(config.converter.with_attached_stdio(true));
    let job = CoverArtJob {
        input_path: args.input.clone(),
        output_path: args.output.clone(),
        codec: args.codec.clone(),
        scale: args.scale.clone(),
        overwrite: args.overwrite.policy().unwrap_or(OverwritePolicy::Ask),
    };

    let result = converter
        .extract_cover_art(&cancel, job)
        .await
        .with_context(|| format!("Failed to extract cover art from {}", args.input.display()))?;
    debug!("Wrote {} in {} ms", result.output_path.display(), result.duration_ms);
    Ok(())
}
