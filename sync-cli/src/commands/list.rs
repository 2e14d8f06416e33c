//! List local reservations.

use anyhow::Result;
use std::path::Path;
use terrace_sync_client::LocalStore;
use terrace_sync_types::Reservation;

use crate::config::Config;
use crate::engine::open_store;

/// Run the list command.
pub async fn run(data_dir: &Path, config: &Config) -> Result<Vec<Reservation>> {
    let store = open_store(data_dir, config).await?;
    let mut reservations = store.list_reservations().await?;
    reservations.sort_by(|a, b| (a.date, a.start_time).cmp(&(b.date, b.start_time)));

    if reservations.is_empty() {
        println!("No reservations.");
        return Ok(reservations);
    }

    for r in &reservations {
        println!(
            "{:<40} {} {}  {:<6} {:<10}{}",
            r.id.as_str(),
            r.date,
            r.start_time.format("%H:%M"),
            r.kind.as_str(),
            r.status.as_str(),
            if r.pending { " (pending sync)" } else { "" }
        );
    }

    Ok(reservations)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::reserve::{self, ReserveArgs};
    use tempfile::tempdir;

    #[tokio::test]
    async fn list_is_sorted_by_schedule() {
        let dir = tempdir().unwrap();
        let config = Config::default();
        for (date, start) in [("2026-07-05", "10:00"), ("2026-07-04", "21:00"), ("2026-07-04", "09:00")] {
            reserve::run(
                dir.path(),
                &config,
                ReserveArgs {
                    owner: "user-1".into(),
                    date: date.into(),
                    start: start.into(),
                    ..ReserveArgs::default()
                },
            )
            .await
            .unwrap();
        }

        let listed = run(dir.path(), &config).await.unwrap();

        let schedule: Vec<String> = listed
            .iter()
            .map(|r| format!("{} {}", r.date, r.start_time.format("%H:%M")))
            .collect();
        assert_eq!(
            schedule,
            vec!["2026-07-04 09:00", "2026-07-04 21:00", "2026-07-05 10:00"]
        );
    }

    #[tokio::test]
    async fn list_on_empty_store() {
        let dir = tempdir().unwrap();
        assert!(run(dir.path(), &Config::default()).await.unwrap().is_empty());
    }
}
