//! Status reporting for UI badges.

use chrono::Utc;
use terrace_sync_core::SyncStatus;

use crate::network::NetworkStatusSource;
use crate::store::{LocalStore, StoreError};

/// Collect a status snapshot from the store and the connectivity source.
pub async fn collect_status<S, N>(store: &S, network: &N) -> Result<SyncStatus, StoreError>
where
    S: LocalStore + ?Sized,
    N: NetworkStatusSource + ?Sized,
{
    let outbox_len = store.outbox_len().await?;
    let reservations = store.list_reservations().await?;
    Ok(SyncStatus::aggregate(
        network.is_online(),
        outbox_len,
        &reservations,
        Utc::now(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::ManualNetworkSource;
    use crate::store::fixtures::{local_reservation, server_reservation};
    use crate::store::MemoryStore;
    use terrace_sync_types::OutboxOperation;

    #[tokio::test]
    async fn reports_outbox_and_pending_counts() {
        let store = MemoryStore::new();
        let r = local_reservation("local_1");
        store
            .stage_create(&r, &OutboxOperation::create(r.clone(), Utc::now()))
            .await
            .unwrap();
        store
            .upsert_reservation(&server_reservation("srv_1"))
            .await
            .unwrap();
        let network = ManualNetworkSource::new(false);

        let status = collect_status(&store, &network).await.unwrap();

        assert!(!status.online);
        assert_eq!(status.outbox_len, 1);
        assert_eq!(status.pending_reservations, 1);
        assert_eq!(status.total_reservations, 2);
    }

    #[tokio::test]
    async fn follows_connectivity() {
        let store = MemoryStore::new();
        let network = ManualNetworkSource::new(false);
        network.set_online(true);

        let status = collect_status(&store, &network).await.unwrap();

        assert!(status.online);
        assert!(!status.has_pending_work());
    }
}
