//! In-memory local store for tests and ephemeral sessions.

use super::{LocalStore, StoreError};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use terrace_sync_types::{MappingEntry, OutboxOperation, Reservation, ReservationId};
use tokio::sync::RwLock;

/// In-memory local store.
///
/// All three tables sit behind one lock, so multi-table writes are atomic.
/// Clones share the same tables.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    tables: Arc<RwLock<Tables>>,
}

#[derive(Debug, Default)]
struct Tables {
    reservations: BTreeMap<ReservationId, Reservation>,
    outbox: HashMap<String, OutboxOperation>,
    mappings: HashMap<ReservationId, MappingEntry>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl LocalStore for MemoryStore {
    async fn upsert_reservation(&self, reservation: &Reservation) -> Result<(), StoreError> {
        let mut tables = self.tables.write().await;
        tables
            .reservations
            .insert(reservation.id.clone(), reservation.clone());
        Ok(())
    }

    async fn replace_reservations(&self, reservations: &[Reservation]) -> Result<(), StoreError> {
        let mut tables = self.tables.write().await;
        tables.reservations = reservations
            .iter()
            .map(|r| (r.id.clone(), r.clone()))
            .collect();
        Ok(())
    }

    async fn get_reservation(&self, id: &ReservationId) -> Result<Option<Reservation>, StoreError> {
        Ok(self.tables.read().await.reservations.get(id).cloned())
    }

    async fn delete_reservation(&self, id: &ReservationId) -> Result<bool, StoreError> {
        Ok(self.tables.write().await.reservations.remove(id).is_some())
    }

    async fn list_reservations(&self) -> Result<Vec<Reservation>, StoreError> {
        Ok(self.tables.read().await.reservations.values().cloned().collect())
    }

    async fn stage_create(
        &self,
        reservation: &Reservation,
        operation: &OutboxOperation,
    ) -> Result<(), StoreError> {
        let mut tables = self.tables.write().await;
        tables
            .reservations
            .insert(reservation.id.clone(), reservation.clone());
        tables
            .outbox
            .insert(operation.op_id().to_string(), operation.clone());
        Ok(())
    }

    async fn promote(
        &self,
        client_id: &ReservationId,
        server_id: &ReservationId,
        at: DateTime<Utc>,
    ) -> Result<Option<Reservation>, StoreError> {
        let mut tables = self.tables.write().await;

        let Some(reservation) = tables.reservations.remove(client_id) else {
            return Ok(None);
        };

        let promoted = reservation.promote(server_id.clone());
        tables
            .reservations
            .insert(server_id.clone(), promoted.clone());
        tables.mappings.insert(
            client_id.clone(),
            MappingEntry::new(client_id.clone(), server_id.clone(), at),
        );

        Ok(Some(promoted))
    }

    async fn enqueue(&self, operation: &OutboxOperation) -> Result<(), StoreError> {
        self.tables
            .write()
            .await
            .outbox
            .insert(operation.op_id().to_string(), operation.clone());
        Ok(())
    }

    async fn list_outbox(&self) -> Result<Vec<OutboxOperation>, StoreError> {
        let tables = self.tables.read().await;
        let mut entries: Vec<OutboxOperation> = tables.outbox.values().cloned().collect();
        entries.sort_by(|a, b| {
            a.queued_at()
                .cmp(&b.queued_at())
                .then_with(|| a.op_id().cmp(b.op_id()))
        });
        Ok(entries)
    }

    async fn remove_outbox(&self, op_ids: &[String]) -> Result<(), StoreError> {
        let mut tables = self.tables.write().await;
        for op_id in op_ids {
            tables.outbox.remove(op_id);
        }
        Ok(())
    }

    async fn clear_outbox(&self) -> Result<(), StoreError> {
        self.tables.write().await.outbox.clear();
        Ok(())
    }

    async fn outbox_len(&self) -> Result<usize, StoreError> {
        Ok(self.tables.read().await.outbox.len())
    }

    async fn set_mapping(&self, entry: &MappingEntry) -> Result<(), StoreError> {
        self.tables
            .write()
            .await
            .mappings
            .insert(entry.client_id.clone(), entry.clone());
        Ok(())
    }

    async fn get_mapping(
        &self,
        client_id: &ReservationId,
    ) -> Result<Option<MappingEntry>, StoreError> {
        Ok(self.tables.read().await.mappings.get(client_id).cloned())
    }
}
