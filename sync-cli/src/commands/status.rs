//! Show sync status.

use anyhow::Result;
use std::path::Path;
use terrace_sync_client::collect_status;
use terrace_sync_core::SyncStatus;

use crate::config::Config;
use crate::engine::{open_store, Connectivity, Mode};

/// Run the status command.
pub async fn run(data_dir: &Path, config: &Config, mode: Mode) -> Result<SyncStatus> {
    let store = open_store(data_dir, config).await?;
    let network = Connectivity::new(config, mode).await;

    let status = collect_status(store.as_ref(), &network).await?;

    println!("=== terrace-sync status ===");
    println!();
    println!("Backend:      {}", config.remote.base_url);
    println!("Connection:   {}", if status.online { "ONLINE" } else { "OFFLINE" });
    println!("Outbox:       {} queued", status.outbox_len);
    println!(
        "Reservations: {} total, {} pending",
        status.total_reservations, status.pending_reservations
    );
    if status.has_pending_work() && !status.online {
        println!();
        println!("Pending work will sync when connectivity returns.");
    }

    Ok(status)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::reserve::{self, ReserveArgs};
    use tempfile::tempdir;

    #[tokio::test]
    async fn status_on_empty_data_dir() {
        let dir = tempdir().unwrap();

        let status = run(
            dir.path(),
            &Config::default(),
            Mode {
                mock: true,
                offline: true,
            },
        )
        .await
        .unwrap();

        assert!(!status.online);
        assert_eq!(status.total_reservations, 0);
    }

    #[tokio::test]
    async fn status_counts_queued_reservations() {
        let dir = tempdir().unwrap();
        let config = Config::default();
        reserve::run(
            dir.path(),
            &config,
            ReserveArgs {
                owner: "user-1".into(),
                date: "2026-07-04".into(),
                start: "12:00".into(),
                ..ReserveArgs::default()
            },
        )
        .await
        .unwrap();

        let status = run(
            dir.path(),
            &config,
            Mode {
                mock: true,
                offline: false,
            },
        )
        .await
        .unwrap();

        assert!(status.online);
        assert_eq!(status.outbox_len, 1);
        assert_eq!(status.pending_reservations, 1);
    }
}
