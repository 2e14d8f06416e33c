//! Run one sync pass.

use anyhow::Result;
use std::path::Path;
use terrace_sync_client::{SyncError, SyncReport};

use crate::config::Config;
use crate::engine::{open_engine, Mode};

/// Run the sync command.
///
/// Being offline is not an error here: the outbox simply waits.
pub async fn run(data_dir: &Path, config: &Config, mode: Mode) -> Result<Option<SyncReport>> {
    let engine = open_engine(data_dir, config, mode).await?;

    match engine.sync().await {
        Ok(report) => {
            print_report(&report);
            Ok(Some(report))
        }
        Err(SyncError::NoConnectivity) => {
            println!("Offline: reservations stay queued until connectivity returns.");
            Ok(None)
        }
        Err(e) => Err(e.into()),
    }
}

fn print_report(report: &SyncReport) {
    if report.is_noop() && report.skipped.is_empty() {
        println!("Nothing to sync.");
        return;
    }

    println!("Sync complete.");
    println!("  Synced:   {}", report.synced_count);
    println!("  Saved:    {}", report.saved_count);
    if let Some(message) = &report.message {
        println!("  Message:  {}", message);
    }
    for mapping in &report.promoted {
        println!("  {} -> {}", mapping.client_id, mapping.server_id);
    }
    if !report.gaps.is_empty() {
        println!("  Unmatched ids: {}", report.gaps.len());
    }
    if !report.skipped.is_empty() {
        println!("  Kept in outbox (not synced): {}", report.skipped.len());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::reserve::{self, ReserveArgs};
    use crate::engine::open_store;
    use tempfile::tempdir;
    use terrace_sync_client::LocalStore;

    fn args() -> ReserveArgs {
        ReserveArgs {
            owner: "user-1".into(),
            date: "2026-07-04".into(),
            start: "19:30".into(),
            ..ReserveArgs::default()
        }
    }

    #[tokio::test]
    async fn offline_sync_keeps_outbox() {
        let dir = tempdir().unwrap();
        let config = Config::default();
        reserve::run(dir.path(), &config, args()).await.unwrap();

        let report = run(
            dir.path(),
            &config,
            Mode {
                mock: true,
                offline: true,
            },
        )
        .await
        .unwrap();

        assert!(report.is_none());
        let store = open_store(dir.path(), &config).await.unwrap();
        assert_eq!(store.outbox_len().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn mock_sync_promotes_reservations() {
        let dir = tempdir().unwrap();
        let config = Config::default();
        let created = reserve::run(dir.path(), &config, args()).await.unwrap();

        let report = run(
            dir.path(),
            &config,
            Mode {
                mock: true,
                offline: false,
            },
        )
        .await
        .unwrap()
        .unwrap();

        assert_eq!(report.promoted.len(), 1);
        assert_eq!(report.promoted[0].client_id, created.id);

        let store = open_store(dir.path(), &config).await.unwrap();
        assert_eq!(store.outbox_len().await.unwrap(), 0);
        let rows = store.list_reservations().await.unwrap();
        assert_eq!(rows.len(), 1);
        assert!(!rows[0].pending);
        assert_eq!(rows[0].id, report.promoted[0].server_id);
    }

    #[tokio::test]
    async fn empty_outbox_is_nothing_to_sync() {
        let dir = tempdir().unwrap();

        let report = run(
            dir.path(),
            &Config::default(),
            Mode {
                mock: true,
                offline: false,
            },
        )
        .await
        .unwrap()
        .unwrap();

        assert!(report.is_noop());
    }
}
