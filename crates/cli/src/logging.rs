//! Subscriber setup shared by the tools.
//!
//! The console layer writes to stderr at `warn`, or `info` with `-v`.
//! `RUST_LOG` overrides both. `--log-file` adds a plain-text layer at
//! `debug` writing to a file, or to stdout when the path is `-`.

use std::fs::File;
use std::path::Path;
use std::sync::Mutex;

use anyhow::{Context, Result};
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::{
    filter::LevelFilter, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer,
};

use crate::options::LogArgs;

/// Installs the global subscriber. Call once, before any other work.
pub fn init_logging(args: &LogArgs) -> Result<()> {
    let default_level = if args.verbose { "info" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| default_level.into());

    let console = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_filter(filter);

    let log_file = match args.log_file {
        Some(ref path) => Some(
            tracing_subscriber::fmt::layer()
                .with_writer(log_writer(path)?)
                .with_ansi(false)
                .with_filter(LevelFilter::DEBUG),
        ),
        None => None,
    };

    tracing_subscriber::registry()
        .with(console)
        .with(log_file)
        .try_init()
        .context("Failed to initialize logging")?;
    Ok(())
}

fn log_writer(path: &Path) -> Result<BoxMakeWriter> {
    if path == Path::new("-") {
        return Ok(BoxMakeWriter::new(std::io::stdout));
    }
    let file = File::create(path)
        .with_context(|| format!("Failed creating log file {}", path.display()))?;
    Ok(BoxMakeWriter::new(Mutex::new(file)))
}
