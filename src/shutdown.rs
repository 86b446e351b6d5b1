use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{error, info, warn};

use crate::{error::BenchError, server::Lifecycle};

/// Forward every interrupt signal received by the process into a channel.
pub fn ctrl_c_signals() -> mpsc::Receiver<()> {
    let (tx, rx) = mpsc::channel(4);
    tokio::spawn(async move {
        loop {
            if let Err(err) = tokio::signal::ctrl_c().await {
                error!("Failed to listen for the interrupt signal: {:?}", err);
                break;
            }
            if tx.send(()).await.is_err() {
                break;
            }
        }
    });
    rx
}

/// Turns termination signals into a graceful shutdown of the server.
pub struct ShutdownController {
    lifecycle: Arc<Lifecycle>,
}

impl ShutdownController {
    pub fn new(lifecycle: Arc<Lifecycle>) -> Self {
        Self { lifecycle }
    }

    /// Wait for the first signal, then run the shutdown on its own task and
    /// wait for it to finish. Signals arriving meanwhile are absorbed.
    ///
    /// Returns `Ok(())` without doing anything if the signal source closes
    /// before any signal arrives.
    pub async fn run(self, mut signals: mpsc::Receiver<()>) -> Result<(), BenchError> {
        if signals.recv().await.is_none() {
            return Ok(());
        }
        info!("Signal caught. Initiating shutdown...");

        let lifecycle = self.lifecycle.clone();
        let mut shutdown = tokio::spawn(async move { lifecycle.shutdown().await });

        loop {
            tokio::select! {
                joined = &mut shutdown => {
                    let result = joined.map_err(|err| BenchError::InternalError(err.to_string()))?;
                    if result.is_ok() {
                        info!("Shutdown complete");
                    }
                    return result;
                }
                Some(()) = signals.recv() => {
                    warn!("Shutdown already in progress, ignoring signal");
                }
            }
        }
    }
}
