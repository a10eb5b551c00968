//! Process shutdown coordination (ambient, §9: no hydrate/dehydrate/reaper
//! responsibilities here — the core persists nothing of its own to snapshot).

use tokio::signal;
use tracing::info;

/// Resolves once a shutdown signal (Ctrl-C, or SIGTERM on unix) is received.
/// Intended as the future passed to `axum::serve(...).with_graceful_shutdown(...)`.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c().await.expect("failed to install Ctrl-C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("received SIGINT, starting graceful shutdown"),
        _ = terminate => info!("received SIGTERM, starting graceful shutdown"),
    }
}
