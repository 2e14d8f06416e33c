//! Mock remote for testing.
//!
//! Allows queueing responses and capturing sent requests for verification.

use super::{RemoteError, ReservationRemote};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use terrace_sync_types::{BulkSyncRequest, BulkSyncResponse, IdMapping, Reservation, ReservationId};

/// Mock reservations backend.
///
/// Clones share state, so a test can keep a handle after moving one into
/// the orchestrator.
#[derive(Debug, Clone, Default)]
pub struct MockRemote {
    inner: Arc<Mutex<MockRemoteInner>>,
}

#[derive(Debug, Default)]
struct MockRemoteInner {
    bulk_responses: VecDeque<BulkSyncResponse>,
    list_responses: VecDeque<Vec<Reservation>>,
    sent_requests: Vec<BulkSyncRequest>,
    listed_owners: Vec<String>,
    fail_next_bulk: Option<RemoteError>,
    fail_next_list: Option<RemoteError>,
    auto_accept: bool,
    issued_ids: u64,
    delay: Option<Duration>,
}

impl MockRemote {
    /// Create a new mock remote.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a mock that accepts every batch and issues `srv_N` ids.
    pub fn accepting() -> Self {
        let mock = Self::default();
        mock.lock().auto_accept = true;
        mock
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MockRemoteInner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Queue a response for the next `bulk_sync()` call.
    pub fn queue_bulk_response(&self, response: BulkSyncResponse) {
        self.lock().bulk_responses.push_back(response);
    }

    /// Queue a response for the next `list_reservations()` call.
    pub fn queue_list_response(&self, reservations: Vec<Reservation>) {
        self.lock().list_responses.push_back(reservations);
    }

    /// Cause the next `bulk_sync()` to fail with the given error.
    pub fn fail_next_bulk(&self, error: RemoteError) {
        self.lock().fail_next_bulk = Some(error);
    }

    /// Cause the next `list_reservations()` to fail with the given error.
    pub fn fail_next_list(&self, error: RemoteError) {
        self.lock().fail_next_list = Some(error);
    }

    /// Delay every call by `delay`.
    pub fn set_delay(&self, delay: Duration) {
        self.lock().delay = Some(delay);
    }

    /// Get all bulk requests that were sent.
    pub fn sent_requests(&self) -> Vec<BulkSyncRequest> {
        self.lock().sent_requests.clone()
    }

    /// Get the last bulk request that was sent.
    pub fn last_request(&self) -> Option<BulkSyncRequest> {
        self.lock().sent_requests.last().cloned()
    }

    /// Number of `bulk_sync()` calls made so far.
    pub fn bulk_calls(&self) -> usize {
        self.lock().sent_requests.len()
    }

    /// Owners passed to `list_reservations()`.
    pub fn listed_owners(&self) -> Vec<String> {
        self.lock().listed_owners.clone()
    }

    /// Clear all state.
    pub fn reset(&self) {
        *self.lock() = MockRemoteInner::default();
    }

    async fn pause(&self) {
        let delay = self.lock().delay;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
    }
}

#[async_trait]
impl ReservationRemote for MockRemote {
    async fn bulk_sync(&self, request: &BulkSyncRequest) -> Result<BulkSyncResponse, RemoteError> {
        // Recorded before the delay so tests can observe an in-flight call.
        self.lock().sent_requests.push(request.clone());
        self.pause().await;

        let mut inner = self.lock();
        if let Some(error) = inner.fail_next_bulk.take() {
            return Err(error);
        }

        if let Some(response) = inner.bulk_responses.pop_front() {
            return Ok(response);
        }

        if inner.auto_accept {
            let mut mapping = Vec::with_capacity(request.reservations.len());
            for reservation in &request.reservations {
                inner.issued_ids += 1;
                mapping.push(IdMapping {
                    client_id: reservation.client_id.clone(),
                    server_id: ReservationId::new(format!("srv_{}", inner.issued_ids)),
                });
            }
            return Ok(BulkSyncResponse::accepted(mapping));
        }

        Err(RemoteError::Network("no queued response".into()))
    }

    async fn list_reservations(&self, owner_id: &str) -> Result<Vec<Reservation>, RemoteError> {
        self.pause().await;

        let mut inner = self.lock();
        inner.listed_owners.push(owner_id.to_string());

        if let Some(error) = inner.fail_next_list.take() {
            return Err(error);
        }

        Ok(inner.list_responses.pop_front().unwrap_or_default())
    }
}
