use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio_util::sync::CancellationToken;

/// Handle the run loop hands to the request pipeline so a request can ask the
/// whole process to stop taking new work.
#[derive(Debug, Clone, Default)]
pub struct Shutdown {
    token: CancellationToken,
    integrity_fault: Arc<AtomicBool>,
}

impl Shutdown {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ordinary stop, e.g. SIGINT or SIGTERM.
    pub fn request(&self) {
        self.token.cancel();
    }

    /// Stop because a request detected that the process itself may be corrupt.
    pub fn signal_integrity_fault(&self) {
        self.integrity_fault.store(true, Ordering::SeqCst);
        self.token.cancel();
    }

    pub fn is_requested(&self) -> bool {
        self.token.is_cancelled()
    }

    pub fn is_integrity_fault(&self) -> bool {
        self.integrity_fault.load(Ordering::SeqCst)
    }

    pub async fn requested(self) {
        self.token.cancelled_owned().await
    }
}

/// Resolves on Ctrl-C or SIGTERM, then requests shutdown.
pub async fn watch_signals(shutdown: Shutdown) {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %err, "failed to install Ctrl-C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                tracing::error!(error = %err, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("received Ctrl-C, shutting down"),
        _ = terminate => tracing::info!("received SIGTERM, shutting down"),
        _ = shutdown.clone().requested() => return,
    }

    shutdown.request();
}
