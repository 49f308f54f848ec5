//! OS signal handling.
//!
//! # Responsibilities
//! - SIGINT (Ctrl+C) and SIGTERM trigger graceful shutdown
//! - SIGHUP reloads the service registry (unix only)
//!
//! # Design Decisions
//! - Uses Tokio's signal handling (async-safe)
//! - SIGHUP never shuts the node down; a failed reload keeps the old schemas

use tokio::sync::broadcast;

use crate::lifecycle::shutdown::Shutdown;
use crate::registry::RegistryWatcher;

/// Resolve once SIGINT or SIGTERM arrives.
pub async fn wait_for_shutdown() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("Received SIGINT"),
        _ = terminate => tracing::info!("Received SIGTERM"),
    }
}

/// Trigger `shutdown` on the first termination signal.
pub fn spawn_shutdown_listener(shutdown: Shutdown) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        wait_for_shutdown().await;
        shutdown.trigger();
    })
}

/// Reload the registry on every SIGHUP until `shutdown` fires.
#[cfg(unix)]
pub fn spawn_reload_on_sighup(
    watcher: RegistryWatcher,
    mut shutdown: broadcast::Receiver<()>,
) -> std::io::Result<tokio::task::JoinHandle<()>> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut hangup = signal(SignalKind::hangup())?;
    Ok(tokio::spawn(async move {
        loop {
            tokio::select! {
                received = hangup.recv() => {
                    if received.is_none() {
                        break;
                    }
                    tracing::info!("Received SIGHUP, reloading service registry");
                    let watcher = watcher.clone();
                    if let Err(e) = tokio::task::spawn_blocking(move || watcher.reload_logged()).await {
                        tracing::error!(error = %e, "Registry reload task failed");
                    }
                }
                _ = shutdown.recv() => break,
            }
        }
    }))
}

#[cfg(not(unix))]
pub fn spawn_reload_on_sighup(
    _watcher: RegistryWatcher,
    _shutdown: broadcast::Receiver<()>,
) -> std::io::Result<tokio::task::JoinHandle<()>> {
    Ok(tokio::spawn(async {}))
}
