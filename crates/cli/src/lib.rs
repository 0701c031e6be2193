//! Command-line surface of the audio tree tools.

pub mod convert;
pub mod logging;
pub mod options;

use tokio_util::sync::CancellationToken;
use tracing::warn;

/// A token cancelled on the first Ctrl-C.
pub fn interrupt_token() -> CancellationToken {
    let token = CancellationToken::new();
    let cancel = token.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupt received, shutting down...");
            cancel.cancel();
        }
    });
    token
}
