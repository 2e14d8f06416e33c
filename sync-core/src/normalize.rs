//! Outbox normalization.
//!
//! Turns queued operations into the batch sent to the bulk-sync endpoint.
//! Defaulting is total and deterministic: the same operation and the same
//! `now` always produce the same transfer object, and no field is left
//! undefined.

use chrono::{DateTime, Duration, Utc};
use terrace_sync_types::{NormalizedReservation, OperationKind, OutboxOperation, Reservation, RequestKind};

/// Terrace id sent when the reservation has none.
pub const UNASSIGNED_TERRACE_ID: &str = "unassigned";

/// Guest count sent when none was given.
pub const DEFAULT_GUEST_COUNT: u32 = 1;

/// Default duration of a visit, in hours.
pub const VISIT_DURATION_HOURS: f64 = 1.5;

/// Default duration of an event, in hours.
pub const EVENT_DURATION_HOURS: f64 = 5.0;

const MINUTES_PER_DAY: f64 = 24.0 * 60.0;

/// Default duration for a request kind.
pub fn default_duration_hours(kind: RequestKind) -> f64 {
    match kind {
        RequestKind::Visit => VISIT_DURATION_HOURS,
        RequestKind::Event => EVENT_DURATION_HOURS,
    }
}

/// Build the canonical transfer object for one reservation.
///
/// Zero guests and non-positive or non-finite durations count as missing.
pub fn normalize_reservation(reservation: &Reservation, now: DateTime<Utc>) -> NormalizedReservation {
    let event = &reservation.event;

    let duration_hours = event
        .duration_hours
        .filter(|h| h.is_finite() && *h > 0.0)
        .unwrap_or_else(|| default_duration_hours(reservation.kind));

    let guest_count = event
        .guest_count
        .filter(|g| *g > 0)
        .unwrap_or(DEFAULT_GUEST_COUNT);

    let end_time = reservation.end_time.unwrap_or_else(|| {
        // Wraps past midnight; only the offset within a day matters.
        let minutes = ((duration_hours * 60.0).round() % MINUTES_PER_DAY) as i64;
        reservation
            .start_time
            .overflowing_add_signed(Duration::minutes(minutes))
            .0
    });

    let created_at = reservation.created_at.unwrap_or(now);
    let updated_at = reservation.updated_at.unwrap_or(created_at);

    NormalizedReservation {
        client_id: reservation.id.clone(),
        owner_id: reservation.owner_id.clone(),
        terrace_id: non_empty(reservation.terrace_id.as_deref())
            .unwrap_or(UNASSIGNED_TERRACE_ID)
            .to_string(),
        terrace_name: reservation.terrace_name.clone().unwrap_or_default(),
        date: reservation.date,
        start_time: reservation.start_time,
        end_time,
        request_type: reservation.kind,
        event_type: event.event_type.clone().unwrap_or_default(),
        guest_count,
        duration_hours,
        notes: event.notes.clone().unwrap_or_default(),
        status: reservation.status,
        created_at,
        updated_at,
    }
}

fn non_empty(s: Option<&str>) -> Option<&str> {
    s.map(str::trim).filter(|s| !s.is_empty())
}

/// An outbox entry the current protocol does not transmit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedOperation {
    /// The entry's op id.
    pub op_id: String,
    /// The entry's kind.
    pub kind: OperationKind,
}

/// Result of normalizing an outbox snapshot.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Batch {
    /// Transfer objects, in outbox order.
    pub reservations: Vec<NormalizedReservation>,
    /// Op ids of the creates included in `reservations`.
    pub submitted: Vec<String>,
    /// Update/delete entries left in the outbox.
    pub skipped: Vec<SkippedOperation>,
}

impl Batch {
    /// Whether there is nothing to send.
    pub fn is_empty(&self) -> bool {
        self.reservations.is_empty()
    }
}

/// Normalize every queued create; collect the rest as skipped.
pub fn build_batch(operations: &[OutboxOperation], now: DateTime<Utc>) -> Batch {
    let mut batch = Batch::default();

    for op in operations {
        match op {
            OutboxOperation::Create {
                op_id, reservation, ..
            } => {
                batch.reservations.push(normalize_reservation(reservation, now));
                batch.submitted.push(op_id.clone());
            }
            OutboxOperation::Update { op_id, .. } | OutboxOperation::Delete { op_id, .. } => {
                batch.skipped.push(SkippedOperation {
                    op_id: op_id.clone(),
                    kind: op.kind(),
                });
            }
        }
    }

    batch
}
