//! Signal handling for graceful shutdown
//!
//! This module provides utilities for handling system signals (CTRL-C, SIGTERM)
//! and a listener the reconciliation engine polls between and during transfers.

use tokio::signal;
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::{RecvError, TryRecvError};
use tokio::task::JoinHandle;
use tracing::{error, info};

/// Signal handler for graceful shutdown coordination
pub struct SignalHandler {
    shutdown_tx: broadcast::Sender<()>,
}

impl SignalHandler {
    /// Create a new signal handler with the given shutdown broadcaster
    pub fn new(shutdown_tx: broadcast::Sender<()>) -> Self {
        Self { shutdown_tx }
    }

    /// Setup signal handling for graceful shutdown (CTRL-C, SIGTERM)
    ///
    /// Returns a handle to the background task that monitors for signals.
    /// When a signal is received, it broadcasts shutdown to all subscribers.
    pub fn setup(&self) -> JoinHandle<()> {
        let shutdown_tx = self.shutdown_tx.clone();

        tokio::spawn(async move {
            let ctrl_c = async {
                match signal::ctrl_c().await {
                    Ok(()) => info!("Ctrl+C signal received"),
                    Err(e) => {
                        error!("Failed to install Ctrl+C handler: {}", e);
                        std::future::pending::<()>().await;
                    }
                }
            };

            #[cfg(unix)]
            let terminate = async {
                match signal::unix::signal(signal::unix::SignalKind::terminate()) {
                    Ok(mut stream) => {
                        stream.recv().await;
                        info!("SIGTERM signal received");
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
                    info!("Received Ctrl+C, initiating shutdown");
                },
                _ = terminate => {
                    info!("Received terminate signal, initiating shutdown");
                },
            }

            // Broadcast shutdown signal to all listeners
            let _ = shutdown_tx.send(());
        })
    }
}

/// Create a shutdown signal broadcaster
///
/// Returns a tuple of (sender, receiver) for shutdown coordination.
pub fn create_shutdown_channel() -> (broadcast::Sender<()>, broadcast::Receiver<()>) {
    broadcast::channel(1)
}

/// Receiving end of the shutdown channel as seen by long-running work
///
/// Once a shutdown has been observed the listener stays triggered. A closed channel
/// without a message never triggers.
#[derive(Debug, Default)]
pub struct ShutdownListener {
    rx: Option<broadcast::Receiver<()>>,
    triggered: bool,
}

impl ShutdownListener {
    /// Listen on the given receiver
    pub fn new(rx: broadcast::Receiver<()>) -> Self {
        Self {
            rx: Some(rx),
            triggered: false,
        }
    }

    /// A listener that is never triggered
    pub fn never() -> Self {
        Self::default()
    }

    /// Non-blocking check for a pending shutdown
    pub fn is_triggered(&mut self) -> bool {
        if !self.triggered {
            if let Some(rx) = self.rx.as_mut() {
                self.triggered = match rx.try_recv() {
                    Ok(()) | Err(TryRecvError::Lagged(_)) => true,
                    Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => false,
                };
            }
        }
        self.triggered
    }

    /// Resolve once shutdown is requested
    pub async fn cancelled(&mut self) {
        if self.triggered {
            return;
        }
        match self.rx.as_mut() {
            Some(rx) => match rx.recv().await {
                Ok(()) | Err(RecvError::Lagged(_)) => self.triggered = true,
                Err(RecvError::Closed) => std::future::pending::<()>().await,
            },
            None => std::future::pending::<()>().await,
        }
    }
}
