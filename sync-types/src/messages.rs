//! Wire messages exchanged with the reservations backend.
//!
//! All bodies are JSON with camelCase field names. The id mapping keeps the
//! backend's historical `clienteId` spelling.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::{ReservationId, ReservationStatus, RequestKind};

/// Canonical transfer object for one queued create.
///
/// Every field is required: defaulting happens before this type is built,
/// so nothing reaches the wire undefined.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalizedReservation {
    /// Client-generated id, echoed back in the mapping.
    pub client_id: ReservationId,
    /// Owner reference.
    pub owner_id: String,
    /// Terrace reference (sentinel when unknown).
    pub terrace_id: String,
    /// Terrace display name (empty when unknown).
    pub terrace_name: String,
    /// Scheduled day.
    pub date: NaiveDate,
    /// Window start.
    pub start_time: NaiveTime,
    /// Window end.
    pub end_time: NaiveTime,
    /// Visit or event.
    pub request_type: RequestKind,
    /// Event type (empty when not given).
    pub event_type: String,
    /// Guest count.
    pub guest_count: u32,
    /// Duration in hours.
    pub duration_hours: f64,
    /// Notes (empty when not given).
    pub notes: String,
    /// Business status.
    pub status: ReservationStatus,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Last update time.
    pub updated_at: DateTime<Utc>,
}

/// Body of the bulk-sync request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BulkSyncRequest {
    /// Every normalized create of the pass.
    pub reservations: Vec<NormalizedReservation>,
}

/// One client-to-server id association returned by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdMapping {
    /// The id the client sent.
    #[serde(rename = "clienteId", alias = "clientId")]
    pub client_id: ReservationId,
    /// The id the server assigned.
    #[serde(rename = "serverId")]
    pub server_id: ReservationId,
}

/// Body of the bulk-sync response.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkSyncResponse {
    /// Overall outcome.
    pub success: bool,
    /// Id associations for accepted records. Absent and `null` both mean none.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub mapping: Vec<IdMapping>,
    /// Records the server processed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub synced_count: Option<u32>,
    /// Records the server newly persisted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub saved_count: Option<u32>,
    /// Human-readable message.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Error description when `success` is false.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<Vec<IdMapping>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<IdMapping>>::deserialize(deserializer)?.unwrap_or_default())
}

impl BulkSyncResponse {
    /// Successful response carrying the given mappings.
    pub fn accepted(mapping: Vec<IdMapping>) -> Self {
        let count = mapping.len() as u32;
        Self {
            success: true,
            mapping,
            synced_count: Some(count),
            saved_count: Some(count),
            message: None,
            error: None,
        }
    }

    /// Rejected response with an error description.
    pub fn rejected(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(error.into()),
            ..Self::default()
        }
    }
}
