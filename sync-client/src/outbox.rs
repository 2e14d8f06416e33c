//! Outbox queue over a local store.
//!
//! Entries are keyed by op id: enqueueing the same op id again overwrites
//! the previous entry instead of duplicating it.

use chrono::Utc;
use std::sync::Arc;
use terrace_sync_types::{OutboxOperation, Reservation, ReservationDraft, ReservationId, ReservationPatch};

use crate::store::{LocalStore, StoreError};

/// Durable queue of pending mutations.
pub struct Outbox<S> {
    store: Arc<S>,
}

impl<S> Clone for Outbox<S> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
        }
    }
}

impl<S: LocalStore> Outbox<S> {
    /// Create an outbox over `store`.
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Create a local reservation and queue it for sync.
    ///
    /// The reservation row and the outbox entry are written together.
    pub async fn create_reservation(&self, draft: ReservationDraft) -> Result<Reservation, StoreError> {
        let now = Utc::now();
        let reservation = Reservation::new_local(draft, now);
        let operation = OutboxOperation::create(reservation.clone(), now);

        self.store.stage_create(&reservation, &operation).await?;
        tracing::debug!("Queued create {}", reservation.id);
        Ok(reservation)
    }

    /// Queue a change to an existing reservation.
    pub async fn queue_update(
        &self,
        reservation_id: ReservationId,
        patch: ReservationPatch,
    ) -> Result<OutboxOperation, StoreError> {
        let operation = OutboxOperation::update(reservation_id, patch, Utc::now());
        self.enqueue(&operation).await?;
        Ok(operation)
    }

    /// Queue removal of a reservation.
    pub async fn queue_delete(&self, reservation_id: ReservationId) -> Result<OutboxOperation, StoreError> {
        let operation = OutboxOperation::delete(reservation_id, Utc::now());
        self.enqueue(&operation).await?;
        Ok(operation)
    }

    /// Add an entry, overwriting any entry with the same op id.
    pub async fn enqueue(&self, operation: &OutboxOperation) -> Result<(), StoreError> {
        self.store.enqueue(operation).await?;
        tracing::debug!("Enqueued {} {}", operation.kind().as_str(), operation.op_id());
        Ok(())
    }

    /// All entries, oldest first.
    pub async fn entries(&self) -> Result<Vec<OutboxOperation>, StoreError> {
        self.store.list_outbox().await
    }

    /// Number of entries.
    pub async fn len(&self) -> Result<usize, StoreError> {
        self.store.outbox_len().await
    }

    /// Whether the outbox is empty.
    pub async fn is_empty(&self) -> Result<bool, StoreError> {
        Ok(self.len().await? == 0)
    }

    /// Remove the given entries.
    pub async fn retire(&self, op_ids: &[String]) -> Result<(), StoreError> {
        self.store.remove_outbox(op_ids).await
    }

    /// Remove every entry.
    pub async fn clear(&self) -> Result<(), StoreError> {
        self.store.clear_outbox().await
    }
}
