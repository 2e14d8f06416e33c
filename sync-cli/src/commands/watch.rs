//! Keep syncing in the background until interrupted.

use anyhow::{Context, Result};
use std::future::Future;
use std::path::Path;
use terrace_sync_client::NetworkMonitor;
use terrace_sync_core::PassOutcome;
use tokio::sync::broadcast::error::RecvError;

use crate::config::Config;
use crate::engine::{open_engine, Mode};

/// Run the watch command until Ctrl-C.
pub async fn run(data_dir: &Path, config: &Config, mode: Mode) -> Result<usize> {
    run_until(data_dir, config, mode, async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl-C: {}", e);
        }
    })
    .await
}

/// Run the watch loop until `shutdown` completes.
///
/// Returns the number of passes observed.
pub async fn run_until<F>(data_dir: &Path, config: &Config, mode: Mode, shutdown: F) -> Result<usize>
where
    F: Future<Output = ()>,
{
    let engine = open_engine(data_dir, config, mode)
        .await
        .context("Failed to start sync engine")?;
    let mut outcomes = engine.subscribe();
    let mut monitor = NetworkMonitor::start(engine.clone());

    println!("Watching for connectivity changes (Ctrl-C to stop)...");

    tokio::pin!(shutdown);
    let mut passes = 0;

    loop {
        tokio::select! {
            _ = &mut shutdown => break,
            outcome = outcomes.recv() => match outcome {
                Ok(PassOutcome::Succeeded { synced_count }) => {
                    passes += 1;
                    if synced_count > 0 {
                        println!("Synced {} reservations.", synced_count);
                    }
                }
                Ok(PassOutcome::Failed { error }) => {
                    passes += 1;
                    println!("Sync failed: {} (will retry on next trigger)", error);
                }
                Err(RecvError::Lagged(_)) => continue,
                Err(RecvError::Closed) => break,
            },
        }
    }

    monitor.stop();
    println!("Stopped.");
    Ok(passes)
}
