//! Merge a fresh server listing with local state.
//!
//! The server view wins for every confirmed record. Local rows that are
//! still pending survive the refresh, unless the listing already contains
//! the server id they were mapped to.

use std::collections::{HashMap, HashSet};
use terrace_sync_types::{Reservation, ReservationId};

/// Rows that replace the local reservation table after a refresh.
///
/// `mappings` holds known `client_id -> server_id` associations.
pub fn merge_server_view(
    server: Vec<Reservation>,
    local: Vec<Reservation>,
    mappings: &HashMap<ReservationId, ReservationId>,
) -> Vec<Reservation> {
    let server_ids: HashSet<ReservationId> = server.iter().map(|r| r.id.clone()).collect();

    let mut merged: Vec<Reservation> = server
        .into_iter()
        .map(|mut r| {
            r.pending = false;
            r
        })
        .collect();

    for row in local.into_iter().filter(|r| r.pending) {
        if server_ids.contains(&row.id) {
            continue;
        }
        if let Some(server_id) = mappings.get(&row.id) {
            if server_ids.contains(server_id) {
                continue;
            }
        }
        merged.push(row);
    }

    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, NaiveTime, Utc};
    use terrace_sync_types::{EventDetails, RequestKind, ReservationDraft};

    fn row(id: &str, pending: bool) -> Reservation {
        let mut r = Reservation::new_local(
            ReservationDraft {
                owner_id: "u".into(),
                terrace_id: None,
                terrace_name: None,
                date: NaiveDate::from_ymd_opt(2026, 8, 1).unwrap(),
                start_time: NaiveTime::from_hms_opt(20, 0, 0).unwrap(),
                end_time: None,
                kind: RequestKind::Event,
                event: EventDetails::default(),
            },
            Utc::now(),
        );
        r.id = ReservationId::new(id);
        r.pending = pending;
        r
    }

    fn ids(rows: &[Reservation]) -> Vec<&str> {
        rows.iter().map(|r| r.id.as_str()).collect()
    }

    #[test]
    fn keeps_pending_local_rows() {
        let merged = merge_server_view(
            vec![row("srv_1", false)],
            vec![row("local_a", true), row("srv_old", false)],
            &HashMap::new(),
        );

        assert_eq!(ids(&merged), vec!["srv_1", "local_a"]);
    }

    #[test]
    fn drops_pending_row_already_listed_under_server_id() {
        let mut mappings = HashMap::new();
        mappings.insert(ReservationId::new("local_a"), ReservationId::new("srv_1"));

        let merged = merge_server_view(
            vec![row("srv_1", false)],
            vec![row("local_a", true)],
            &mappings,
        );

        assert_eq!(ids(&merged), vec!["srv_1"]);
    }

    #[test]
    fn server_rows_are_never_pending() {
        let merged = merge_server_view(vec![row("srv_1", true)], vec![], &HashMap::new());
        assert!(!merged[0].pending);
    }

    #[test]
    fn empty_listing_keeps_only_pending() {
        let merged = merge_server_view(
            vec![],
            vec![row("local_a", true), row("srv_9", false)],
            &HashMap::new(),
        );
        assert_eq!(ids(&merged), vec!["local_a"]);
    }
}
