//! Graceful shutdown coordination.
//!
//! One coordinator per process turns Ctrl+C or SIGTERM into a broadcast that
//! every running server (the relay, and the sandbox when started) waits on.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::signal;
use tokio::sync::broadcast;
use tracing::{error, info, warn};

/// Shutdown coordinator shared by the servers of one process
#[derive(Debug, Clone)]
pub struct ShutdownCoordinator {
    shutdown_initiated: Arc<AtomicBool>,
    shutdown_tx: broadcast::Sender<()>,
}

impl Default for ShutdownCoordinator {
    fn default() -> Self {
        Self::new()
    }
}

impl ShutdownCoordinator {
    pub fn new() -> Self {
        let (shutdown_tx, _) = broadcast::channel(16);

        Self {
            shutdown_initiated: Arc::new(AtomicBool::new(false)),
            shutdown_tx,
        }
    }

    pub fn is_shutdown_initiated(&self) -> bool {
        self.shutdown_initiated.load(Ordering::Relaxed)
    }

    /// Receiver notified once shutdown is initiated
    pub fn subscribe(&self) -> broadcast::Receiver<()> {
        self.shutdown_tx.subscribe()
    }

    /// Resolves when shutdown is initiated, even if it already was
    pub async fn shutdown_requested(&self) {
        let mut rx = self.subscribe();
        if self.is_shutdown_initiated() {
            return;
        }
        let _ = rx.recv().await;
    }

    /// Initiate graceful shutdown; later calls are no-ops
    pub fn initiate_shutdown(&self) {
        if !self.shutdown_initiated.swap(true, Ordering::Relaxed) {
            info!("Initiating graceful shutdown...");
            if let Err(e) = self.shutdown_tx.send(()) {
                warn!("No server listening for the shutdown signal: {}", e);
            }
        }
    }

    /// Wait for Ctrl+C or SIGTERM, then initiate shutdown
    pub async fn wait_for_shutdown_signal(&self) {
        let ctrl_c = async {
            if let Err(e) = signal::ctrl_c().await {
                error!("Failed to install Ctrl+C handler: {}", e);
                std::future::pending::<()>().await;
            }
        };

        #[cfg(unix)]
        let terminate = async {
            match signal::unix::signal(signal::unix::SignalKind::terminate()) {
                Ok(mut sigterm) => {
                    sigterm.recv().await;
                }
                Err(e) => {
                    error!("Failed to install SIGTERM handler: {}", e);
                    std::future::pending::<()>().await;
                }
            }
        };

        #[cfg(not(unix))]
        let terminate = std::future::pending::<()>();

        tokio::select! {
            _ = ctrl_c => {
                info!("Received Ctrl+C signal");
            }
            _ = terminate => {
                info!("Received SIGTERM signal");
            }
            _ = self.shutdown_requested() => {}
        }

        self.initiate_shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::{Duration, timeout};

    #[tokio::test]
    async fn test_shutdown_coordinator_creation() {
        let coordinator = ShutdownCoordinator::new();
        assert!(!coordinator.is_shutdown_initiated());
    }

    #[tokio::test]
    async fn test_shutdown_initiation() {
        let coordinator = ShutdownCoordinator::new();
        let mut receiver = coordinator.subscribe();

        coordinator.initiate_shutdown();
        coordinator.initiate_shutdown();

        assert!(coordinator.is_shutdown_initiated());
        assert!(receiver.recv().await.is_ok());
    }

    #[tokio::test]
    async fn test_shutdown_requested_after_initiation() {
        let coordinator = ShutdownCoordinator::new();
        coordinator.initiate_shutdown();

        let resolved = timeout(Duration::from_secs(1), coordinator.shutdown_requested()).await;
        assert!(resolved.is_ok());
    }

    #[tokio::test]
    async fn test_shutdown_requested_wakes_waiters() {
        let coordinator = ShutdownCoordinator::new();
        let waiter = coordinator.clone();
        let handle = tokio::spawn(async move { waiter.shutdown_requested().await });

        tokio::time::sleep(Duration::from_millis(20)).await;
        coordinator.initiate_shutdown();

        assert!(timeout(Duration::from_secs(1), handle).await.is_ok());
    }
}
