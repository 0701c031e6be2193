//! Converts one audio file to flac.

use audiotree_cli::{convert, interrupt_token};
use audiotree_core::AudioFormat;
use tracing::error;

#[tokio::main]
async fn main() {
    if let Err(e) = convert::run(AudioFormat::Flac, interrupt_token()).await {
        error!("Fatal error: {:#}", e);
        std::process::exit(1);
    }
}
