//! Refresh the local reservation table from the backend.

use std::collections::HashMap;
use std::sync::Arc;
use terrace_sync_core::merge_server_view;
use terrace_sync_types::Reservation;
use thiserror::Error;

use crate::remote::{RemoteError, ReservationRemote};
use crate::store::{LocalStore, StoreError};

/// Refresh errors.
#[derive(Debug, Error)]
pub enum LoadError {
    /// The listing request failed; local state is unchanged.
    #[error("network error: {0}")]
    Network(#[from] RemoteError),

    /// The local store failed.
    #[error("storage error: {0}")]
    Storage(#[from] StoreError),
}

/// Outcome of a refresh.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefreshReport {
    /// Rows the server listed.
    pub from_server: usize,
    /// Pending local rows kept.
    pub kept_pending: usize,
}

/// Replaces local reservations with the server view, keeping pending rows.
pub struct ReservationLoader<S, R> {
    store: Arc<S>,
    remote: R,
}

impl<S: LocalStore, R: ReservationRemote> ReservationLoader<S, R> {
    /// Create a loader.
    pub fn new(store: Arc<S>, remote: R) -> Self {
        Self { store, remote }
    }

    /// Fetch `owner_id`'s reservations and rewrite the local table.
    pub async fn refresh(&self, owner_id: &str) -> Result<RefreshReport, LoadError> {
        let server = self.remote.list_reservations(owner_id).await?;
        let local = self.store.list_reservations().await?;

        let mut mappings = HashMap::new();
        for row in local.iter().filter(|r| r.pending) {
            if let Some(entry) = self.store.get_mapping(&row.id).await? {
                mappings.insert(entry.client_id, entry.server_id);
            }
        }

        let from_server = server.len();
        let merged: Vec<Reservation> = merge_server_view(server, local, &mappings);
        let kept_pending = merged.iter().filter(|r| r.pending).count();

        self.store.replace_reservations(&merged).await?;

        tracing::info!(
            "Refreshed reservations for {}: {} from server, {} pending kept",
            owner_id,
            from_server,
            kept_pending
        );
        Ok(RefreshReport {
            from_server,
            kept_pending,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::remote::MockRemote;
    use crate::store::fixtures::{local_reservation, server_reservation};
    use crate::store::{MemoryStore, SqliteStore};
    use chrono::Utc;
    use terrace_sync_types::{MappingEntry, ReservationId};

    #[tokio::test]
    async fn refresh_keeps_pending_and_replaces_confirmed() {
        let store = Arc::new(SqliteStore::in_memory().await.unwrap());
        store.upsert_reservation(&local_reservation("local_a")).await.unwrap();
        store.upsert_reservation(&server_reservation("srv_stale")).await.unwrap();
        let remote = MockRemote::new();
        remote.queue_list_response(vec![server_reservation("srv_1"), server_reservation("srv_2")]);
        let loader = ReservationLoader::new(store.clone(), remote.clone());

        let report = loader.refresh("user-1").await.unwrap();

        assert_eq!(
            report,
            RefreshReport {
                from_server: 2,
                kept_pending: 1
            }
        );
        let ids: Vec<String> = store
            .list_reservations()
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.id.into_inner())
            .collect();
        assert_eq!(ids, vec!["local_a", "srv_1", "srv_2"]);
        assert_eq!(remote.listed_owners(), vec!["user-1".to_string()]);
    }

    #[tokio::test]
    async fn mapped_pending_row_is_replaced_by_server_row() {
        let store = Arc::new(MemoryStore::new());
        store.upsert_reservation(&local_reservation("local_a")).await.unwrap();
        store
            .set_mapping(&MappingEntry::new(
                ReservationId::new("local_a"),
                ReservationId::new("srv_1"),
                Utc::now(),
            ))
            .await
            .unwrap();
        let remote = MockRemote::new();
        remote.queue_list_response(vec![server_reservation("srv_1")]);

        let report = ReservationLoader::new(store.clone(), remote)
            .refresh("user-1")
            .await
            .unwrap();

        assert_eq!(report.kept_pending, 0);
        let rows = store.list_reservations().await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].id.as_str(), "srv_1");
    }

    #[tokio::test]
    async fn failed_listing_leaves_store_untouched() {
        let store = Arc::new(MemoryStore::new());
        store.upsert_reservation(&server_reservation("srv_1")).await.unwrap();
        let remote = MockRemote::new();
        remote.fail_next_list(RemoteError::Timeout);

        let result = ReservationLoader::new(store.clone(), remote).refresh("user-1").await;

        assert!(matches!(result, Err(LoadError::Network(RemoteError::Timeout))));
        assert_eq!(store.list_reservations().await.unwrap().len(), 1);
    }
}
