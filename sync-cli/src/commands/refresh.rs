//! Reload reservations from the backend.

use anyhow::{Context, Result};
use std::path::Path;
use terrace_sync_client::{RefreshReport, ReservationLoader};

use crate::config::Config;
use crate::engine::{open_store, Backend, Mode};

/// Run the refresh command.
pub async fn run(data_dir: &Path, config: &Config, owner: &str, mode: Mode) -> Result<RefreshReport> {
    let store = open_store(data_dir, config).await?;
    let backend = Backend::new(config, mode)?;

    let report = ReservationLoader::new(store, backend)
        .refresh(owner)
        .await
        .context("Failed to refresh reservations")?;

    println!(
        "Loaded {} reservations from the server ({} pending kept locally).",
        report.from_server, report.kept_pending
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::reserve::{self, ReserveArgs};
    use tempfile::tempdir;

    #[tokio::test]
    async fn refresh_keeps_unsynced_reservations() {
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

        let report = run(
            dir.path(),
            &config,
            "user-1",
            Mode {
                mock: true,
                offline: false,
            },
        )
        .await
        .unwrap();

        assert_eq!(report.from_server, 0);
        assert_eq!(report.kept_pending, 1);
    }
}
