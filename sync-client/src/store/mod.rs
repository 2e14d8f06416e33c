//! Local store for reservations, outbox entries and id mappings.
//!
//! Three logical tables:
//! - `reservations` - local snapshots keyed by reservation id
//! - `outbox` - pending mutations keyed by operation id
//! - `id_mappings` - client id to server id associations
//!
//! Every operation is atomic. The two multi-table writes the engine needs,
//! [`LocalStore::stage_create`] and [`LocalStore::promote`], run in a single
//! transaction.

mod memory;
mod sqlite;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::path::PathBuf;
use terrace_sync_types::{MappingEntry, OutboxOperation, Reservation, ReservationId};

/// Local store errors.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The persistence layer could not be opened.
    #[error("local store unavailable at {path}: {source}")]
    Unavailable {
        /// Database location.
        path: PathBuf,
        /// Underlying error.
        source: sqlx::Error,
    },

    /// Database error.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Row payload could not be (de)serialized.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Row content is not valid.
    #[error("corrupt row: {0}")]
    Corrupt(String),
}

/// Trait for local store backends.
#[async_trait]
pub trait LocalStore: Send + Sync {
    /// Insert or replace a reservation.
    async fn upsert_reservation(&self, reservation: &Reservation) -> Result<(), StoreError>;

    /// Replace the whole reservation table.
    ///
    /// No merge happens here: callers that want to keep pending rows must
    /// include them in `reservations`.
    async fn replace_reservations(&self, reservations: &[Reservation]) -> Result<(), StoreError>;

    /// Get a reservation by id.
    async fn get_reservation(&self, id: &ReservationId) -> Result<Option<Reservation>, StoreError>;

    /// Delete a reservation. Returns whether a row was removed.
    async fn delete_reservation(&self, id: &ReservationId) -> Result<bool, StoreError>;

    /// List every local reservation, ordered by id.
    async fn list_reservations(&self) -> Result<Vec<Reservation>, StoreError>;

    /// Write a new reservation and its outbox entry together.
    async fn stage_create(
        &self,
        reservation: &Reservation,
        operation: &OutboxOperation,
    ) -> Result<(), StoreError>;

    /// Re-key a local reservation under its server id.
    ///
    /// Deletes the row under `client_id`, reinserts it under `server_id` with
    /// `pending = false` and records the mapping. Returns `None` and writes
    /// nothing when `client_id` is not present.
    async fn promote(
        &self,
        client_id: &ReservationId,
        server_id: &ReservationId,
        at: DateTime<Utc>,
    ) -> Result<Option<Reservation>, StoreError>;

    /// Add an outbox entry, overwriting any entry with the same op id.
    async fn enqueue(&self, operation: &OutboxOperation) -> Result<(), StoreError>;

    /// List outbox entries, oldest first.
    async fn list_outbox(&self) -> Result<Vec<OutboxOperation>, StoreError>;

    /// Remove the given outbox entries. Unknown ids are ignored.
    async fn remove_outbox(&self, op_ids: &[String]) -> Result<(), StoreError>;

    /// Remove every outbox entry.
    async fn clear_outbox(&self) -> Result<(), StoreError>;

    /// Number of outbox entries.
    async fn outbox_len(&self) -> Result<usize, StoreError> {
        Ok(self.list_outbox().await?.len())
    }

    /// Record a client id to server id association.
    async fn set_mapping(&self, entry: &MappingEntry) -> Result<(), StoreError>;

    /// Look up the server id for a client id.
    async fn get_mapping(&self, client_id: &ReservationId)
        -> Result<Option<MappingEntry>, StoreError>;
}

#[cfg(test)]
pub(crate) mod fixtures {
    use chrono::{NaiveDate, NaiveTime, Utc};
    use terrace_sync_types::{EventDetails, RequestKind, Reservation, ReservationDraft, ReservationId};

    /// A pending reservation with a fixed client id.
    pub fn local_reservation(id: &str) -> Reservation {
        let mut r = Reservation::new_local(
            ReservationDraft {
                owner_id: "user-1".into(),
                terrace_id: Some("terrace-1".into()),
                terrace_name: Some("Sky Deck".into()),
                date: NaiveDate::from_ymd_opt(2026, 6, 12).unwrap(),
                start_time: NaiveTime::from_hms_opt(18, 0, 0).unwrap(),
                end_time: None,
                kind: RequestKind::Visit,
                event: EventDetails::default(),
            },
            Utc::now(),
        );
        r.id = ReservationId::new(id);
        r
    }

    /// A confirmed reservation as the server would return it.
    pub fn server_reservation(id: &str) -> Reservation {
        local_reservation("local_tmp").promote(ReservationId::new(id))
    }
}
