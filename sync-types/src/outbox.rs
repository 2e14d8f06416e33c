//! Outbox operations and id-mapping metadata.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{Reservation, ReservationId, ReservationPatch};

/// Discriminator of an [`OutboxOperation`], used as a storage column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OperationKind {
    /// Reservation creation.
    Create,
    /// Reservation update.
    Update,
    /// Reservation deletion.
    Delete,
}

impl OperationKind {
    /// Storage name of the kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Update => "update",
            Self::Delete => "delete",
        }
    }
}

/// A local mutation waiting for server acknowledgement.
///
/// Keyed by `op_id`. For `Create`, the op id is the reservation's client id,
/// so replaying the same create overwrites instead of appending.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum OutboxOperation {
    /// Create a reservation on the server.
    Create {
        /// Operation id (the reservation's client id).
        op_id: String,
        /// Full snapshot of the reservation at enqueue time.
        reservation: Reservation,
        /// When the operation was queued.
        queued_at: DateTime<Utc>,
    },
    /// Change fields of an existing reservation.
    Update {
        /// Operation id.
        op_id: String,
        /// Target reservation.
        reservation_id: ReservationId,
        /// Fields to change.
        patch: ReservationPatch,
        /// When the operation was queued.
        queued_at: DateTime<Utc>,
    },
    /// Remove a reservation.
    Delete {
        /// Operation id.
        op_id: String,
        /// Target reservation.
        reservation_id: ReservationId,
        /// When the operation was queued.
        queued_at: DateTime<Utc>,
    },
}

impl OutboxOperation {
    /// Build the create operation for a local reservation.
    pub fn create(reservation: Reservation, queued_at: DateTime<Utc>) -> Self {
        Self::Create {
            op_id: reservation.id.as_str().to_string(),
            reservation,
            queued_at,
        }
    }

    /// Build an update operation with a fresh op id.
    pub fn update(
        reservation_id: ReservationId,
        patch: ReservationPatch,
        queued_at: DateTime<Utc>,
    ) -> Self {
        Self::Update {
            op_id: format!("update_{}", uuid::Uuid::new_v4().simple()),
            reservation_id,
            patch,
            queued_at,
        }
    }

    /// Build a delete operation keyed by the target id.
    pub fn delete(reservation_id: ReservationId, queued_at: DateTime<Utc>) -> Self {
        Self::Delete {
            op_id: format!("delete_{}", reservation_id),
            reservation_id,
            queued_at,
        }
    }

    /// Deduplication key.
    pub fn op_id(&self) -> &str {
        match self {
            Self::Create { op_id, .. } | Self::Update { op_id, .. } | Self::Delete { op_id, .. } => {
                op_id
            }
        }
    }

    /// Discriminator.
    pub fn kind(&self) -> OperationKind {
        match self {
            Self::Create { .. } => OperationKind::Create,
            Self::Update { .. } => OperationKind::Update,
            Self::Delete { .. } => OperationKind::Delete,
        }
    }

    /// When the operation was queued.
    pub fn queued_at(&self) -> DateTime<Utc> {
        match self {
            Self::Create { queued_at, .. }
            | Self::Update { queued_at, .. }
            | Self::Delete { queued_at, .. } => *queued_at,
        }
    }
}

/// Persisted `client_id -> server_id` association.
///
/// Stored apart from the reservation row so it survives promotion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MappingEntry {
    /// The id the client generated.
    pub client_id: ReservationId,
    /// The id the server issued.
    pub server_id: ReservationId,
    /// When the association was recorded.
    pub mapped_at: DateTime<Utc>,
}

impl MappingEntry {
    /// Create a mapping entry.
    pub fn new(client_id: ReservationId, server_id: ReservationId, mapped_at: DateTime<Utc>) -> Self {
        Self {
            client_id,
            server_id,
            mapped_at,
        }
    }
}
