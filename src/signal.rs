//! Bridges process termination signals to a client's cancellation scope.
//!
//! The first signal cancels cooperatively. A second one exits the process
//! with status 1, for when a shutdown hangs. This lives outside the watch
//! engine, which itself never exits the process.

use tokio::signal::unix::signal;
use tokio::signal::unix::SignalKind;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::info;

/// SIGINT and SIGTERM. SIGKILL cannot be caught.
pub fn default_signals() -> [SignalKind; 2] {
    [SignalKind::interrupt(), SignalKind::terminate()]
}

pub fn cancel_on_signals(token: CancellationToken) -> std::io::Result<JoinHandle<()>> {
    cancel_on(token, &default_signals())
}

/// Installs handlers for `signals` before returning, then waits for them in
/// the background.
pub fn cancel_on(
    token: CancellationToken,
    signals: &[SignalKind],
) -> std::io::Result<JoinHandle<()>> {
    let (tx, mut rx) = mpsc::unbounded_channel();

    for &kind in signals {
        let mut stream = signal(kind)?;
        let tx = tx.clone();
        tokio::spawn(async move {
            while stream.recv().await.is_some() {
                if tx.send(kind).is_err() {
                    break;
                }
            }
        });
    }
    drop(tx);

    Ok(tokio::spawn(async move {
        let Some(sig) = rx.recv().await else {
            return;
        };
        info!("got signal {:?}, stopping", sig);
        token.cancel();

        if let Some(sig) = rx.recv().await {
            info!("got signal {:?} again, forcing exit", sig);
            std::process::exit(1);
        }
    }))
}
