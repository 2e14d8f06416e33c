//! The reservation record and its local-first lifecycle.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::{ReservationId, TypesError};

/// Lifecycle status of a reservation as seen by the business.
///
/// Independent of the `pending` flag, which only tracks server confirmation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReservationStatus {
    /// Awaiting host approval.
    #[default]
    Pending,
    /// Approved by the host.
    Confirmed,
    /// Cancelled by either party.
    Cancelled,
    /// Took place.
    Completed,
}

impl ReservationStatus {
    /// Wire name of the status.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Confirmed => "confirmed",
            Self::Cancelled => "cancelled",
            Self::Completed => "completed",
        }
    }
}

impl fmt::Display for ReservationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReservationStatus {
    type Err = TypesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "pending" => Ok(Self::Pending),
            "confirmed" => Ok(Self::Confirmed),
            "cancelled" | "canceled" => Ok(Self::Cancelled),
            "completed" => Ok(Self::Completed),
            other => Err(TypesError::InvalidStatus(other.to_string())),
        }
    }
}

/// What the client is asking for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RequestKind {
    /// A short viewing of the terrace.
    #[default]
    Visit,
    /// A full booking for an event.
    Event,
}

impl RequestKind {
    /// Wire name of the kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Visit => "visit",
            Self::Event => "event",
        }
    }
}

impl fmt::Display for RequestKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RequestKind {
    type Err = TypesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "visit" => Ok(Self::Visit),
            "event" | "reservation" => Ok(Self::Event),
            other => Err(TypesError::InvalidKind(other.to_string())),
        }
    }
}

/// Optional event metadata attached to a request.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventDetails {
    /// Free-form event type ("birthday", "corporate", ...).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_type: Option<String>,
    /// Number of expected guests.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub guest_count: Option<u32>,
    /// Requested duration in hours.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_hours: Option<f64>,
    /// Notes for the host.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// User input for a new reservation, before it gets an id.
#[derive(Debug, Clone, PartialEq)]
pub struct ReservationDraft {
    /// Who is booking.
    pub owner_id: String,
    /// Terrace being booked, if already chosen.
    pub terrace_id: Option<String>,
    /// Display name of the terrace.
    pub terrace_name: Option<String>,
    /// Day of the visit or event.
    pub date: NaiveDate,
    /// Start of the window.
    pub start_time: NaiveTime,
    /// End of the window, if known.
    pub end_time: Option<NaiveTime>,
    /// Visit or event.
    pub kind: RequestKind,
    /// Event metadata.
    pub event: EventDetails,
}

/// A booking or visit request.
///
/// `pending == true` exactly when `id` is client-generated and the server has
/// not confirmed the record yet. [`Reservation::promote`] is the only way to
/// move from one state to the other.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reservation {
    /// Client-generated or server-issued id.
    pub id: ReservationId,
    /// Owner (client user) reference.
    pub owner_id: String,
    /// Terrace reference.
    #[serde(default)]
    pub terrace_id: Option<String>,
    /// Terrace display name.
    #[serde(default)]
    pub terrace_name: Option<String>,
    /// Scheduled day.
    pub date: NaiveDate,
    /// Window start.
    pub start_time: NaiveTime,
    /// Window end.
    #[serde(default)]
    pub end_time: Option<NaiveTime>,
    /// Visit or event.
    #[serde(default)]
    pub kind: RequestKind,
    /// Event metadata.
    #[serde(default)]
    pub event: EventDetails,
    /// Business status.
    #[serde(default)]
    pub status: ReservationStatus,
    /// Not yet confirmed by the server.
    #[serde(default)]
    pub pending: bool,
    /// Creation time.
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    /// Last update time.
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Reservation {
    /// Create a local, unconfirmed reservation from user input.
    pub fn new_local(draft: ReservationDraft, now: DateTime<Utc>) -> Self {
        Self {
            id: ReservationId::new_local(),
            owner_id: draft.owner_id,
            terrace_id: draft.terrace_id,
            terrace_name: draft.terrace_name,
            date: draft.date,
            start_time: draft.start_time,
            end_time: draft.end_time,
            kind: draft.kind,
            event: draft.event,
            status: ReservationStatus::Pending,
            pending: true,
            created_at: Some(now),
            updated_at: Some(now),
        }
    }

    /// Re-key this record under a server-issued id and clear `pending`.
    ///
    /// Id and flag change together; nothing else about the record does.
    pub fn promote(mut self, server_id: ReservationId) -> Self {
        self.id = server_id;
        self.pending = false;
        self
    }

    /// Check the pending/id invariant.
    pub fn is_consistent(&self) -> bool {
        self.pending == self.id.is_local()
    }
}

/// Partial change to an existing reservation (queued, not yet transmitted).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReservationPatch {
    /// New status.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<ReservationStatus>,
    /// New day.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<NaiveDate>,
    /// New window start.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_time: Option<NaiveTime>,
    /// New window end.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<NaiveTime>,
    /// New notes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}
