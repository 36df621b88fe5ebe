// ffjob-cli/src/signals.rs
//
// Cancels the running job on Ctrl+C or SIGTERM.
//
// The job itself is fully synchronous. Signal delivery is handled by a small
// current-thread tokio runtime on a background thread that triggers the
// job's cancellation token when a signal arrives.

use ffjob_core::CancellationToken;
use std::io;
use std::thread;
use tokio::signal;

/// Starts a background thread that cancels `token` on SIGINT or SIGTERM.
pub fn spawn_signal_listener(token: CancellationToken) -> io::Result<thread::JoinHandle<()>> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    thread::Builder::new()
        .name("ffjob-signals".to_string())
        .spawn(move || {
            runtime.block_on(shutdown_signal());
            log::warn!("Interrupted, cancelling job");
            token.cancel();
        })
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            log::error!("Failed to install Ctrl+C handler: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                log::error!("Failed to install SIGTERM handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
