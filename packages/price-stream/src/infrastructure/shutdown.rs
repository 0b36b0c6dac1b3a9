//! Graceful Shutdown
//!
//! Bridges process signals onto a [`CancellationToken`]. Every loop in the
//! pipeline watches that token, so cancelling it is the whole shutdown
//! protocol.

use tokio::signal;
use tokio_util::sync::CancellationToken;

/// Wait for SIGINT or SIGTERM, then cancel `shutdown_token`.
#[allow(clippy::expect_used)]
pub async fn await_shutdown(shutdown_token: CancellationToken) {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("signal handler installation is critical for graceful shutdown");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("SIGTERM handler installation is critical for graceful shutdown")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, initiating shutdown");
        }
        () = shutdown_token.cancelled() => {
            return;
        }
    }

    shutdown_token.cancel();
}
