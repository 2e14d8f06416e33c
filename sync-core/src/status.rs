//! Sync status aggregation for UI badges.

use chrono::{DateTime, Utc};
use serde::Serialize;
use terrace_sync_types::Reservation;

/// Snapshot of connectivity and pending work.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncStatus {
    /// Current connectivity.
    pub online: bool,
    /// Entries waiting in the outbox.
    pub outbox_len: usize,
    /// Local reservations not yet confirmed by the server.
    pub pending_reservations: usize,
    /// All local reservations.
    pub total_reservations: usize,
    /// When the snapshot was taken.
    pub checked_at: DateTime<Utc>,
}

impl SyncStatus {
    /// Aggregate a status snapshot from raw inputs.
    pub fn aggregate(
        online: bool,
        outbox_len: usize,
        reservations: &[Reservation],
        checked_at: DateTime<Utc>,
    ) -> Self {
        Self {
            online,
            outbox_len,
            pending_reservations: reservations.iter().filter(|r| r.pending).count(),
            total_reservations: reservations.len(),
            checked_at,
        }
    }

    /// Whether anything still waits for the server.
    pub fn has_pending_work(&self) -> bool {
        self.outbox_len > 0 || self.pending_reservations > 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, NaiveTime};
    use terrace_sync_types::{EventDetails, RequestKind, ReservationDraft, ReservationId};

    fn local() -> Reservation {
        Reservation::new_local(
            ReservationDraft {
                owner_id: "u".into(),
                terrace_id: None,
                terrace_name: None,
                date: NaiveDate::from_ymd_opt(2026, 3, 3).unwrap(),
                start_time: NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
                end_time: None,
                kind: RequestKind::Visit,
                event: EventDetails::default(),
            },
            Utc::now(),
        )
    }

    #[test]
    fn counts_pending_and_total() {
        let confirmed = local().promote(ReservationId::new("srv_1"));
        let rows = vec![local(), local(), confirmed];
        let now = Utc::now();

        let status = SyncStatus::aggregate(false, 2, &rows, now);

        assert!(!status.online);
        assert_eq!(status.outbox_len, 2);
        assert_eq!(status.pending_reservations, 2);
        assert_eq!(status.total_reservations, 3);
        assert_eq!(status.checked_at, now);
        assert!(status.has_pending_work());
    }

    #[test]
    fn empty_store_has_no_pending_work() {
        let status = SyncStatus::aggregate(true, 0, &[], Utc::now());
        assert!(!status.has_pending_work());
        assert_eq!(status.total_reservations, 0);
    }
}
