//! The sync pass.
//!
//! A pass drains the outbox toward the backend in one bulk request and
//! reconciles the returned id mapping into the local store:
//!
//! 1. Refuse if another pass is running or the device is offline.
//! 2. Snapshot the outbox and build the normalized batch.
//! 3. Send the batch; a failure leaves the outbox untouched.
//! 4. Promote each mapped reservation to its server id.
//! 5. Retire the submitted entries.
//!
//! Retrying after any failure is safe: nothing is retired until the backend
//! has answered with success.

use chrono::Utc;
use std::sync::{Arc, Mutex, MutexGuard};
use terrace_sync_core::{build_batch, PassAction, PassEvent, PassOutcome, PassState, SkippedOperation, SyncStatus};
use terrace_sync_types::{BulkSyncRequest, IdMapping, ReservationId};
use thiserror::Error;
use tokio::sync::broadcast;

use crate::config::SyncConfig;
use crate::network::NetworkStatusSource;
use crate::remote::{RemoteError, ReservationRemote};
use crate::status::collect_status;
use crate::store::{LocalStore, StoreError};

/// Sync pass errors.
#[derive(Debug, Error)]
pub enum SyncError {
    /// The device is offline; no request was attempted.
    #[error("no connectivity")]
    NoConnectivity,

    /// Another pass is in flight.
    #[error("a sync pass is already running")]
    AlreadyRunning,

    /// The backend answered but refused the batch.
    #[error("rejected by server: {0}")]
    RemoteRejection(String),

    /// The request did not complete.
    #[error("network error: {0}")]
    Network(#[from] RemoteError),

    /// The local store failed.
    #[error("storage error: {0}")]
    Storage(#[from] StoreError),
}

impl SyncError {
    /// Whether a later pass may succeed without intervention.
    pub fn is_retryable(&self) -> bool {
        !matches!(self, SyncError::Storage(_))
    }
}

/// Result of a successful pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncReport {
    /// Records the backend processed.
    pub synced_count: u32,
    /// Records the backend newly persisted.
    pub saved_count: u32,
    /// Message from the backend.
    pub message: Option<String>,
    /// Mappings applied locally.
    pub promoted: Vec<IdMapping>,
    /// Client ids in the mapping with no local row.
    pub gaps: Vec<ReservationId>,
    /// Entries left in the outbox because they are not transmitted.
    pub skipped: Vec<SkippedOperation>,
}

impl SyncReport {
    /// Whether the pass had nothing to send.
    pub fn is_noop(&self) -> bool {
        self.synced_count == 0 && self.promoted.is_empty() && self.gaps.is_empty()
    }
}

/// Drives sync passes over a store, a backend and a connectivity source.
///
/// At most one pass runs at a time per orchestrator; a second trigger while
/// one is in flight returns [`SyncError::AlreadyRunning`] immediately.
pub struct SyncOrchestrator<S, R, N> {
    config: SyncConfig,
    store: Arc<S>,
    remote: R,
    network: Arc<N>,
    state: Mutex<PassState>,
    outcomes: broadcast::Sender<PassOutcome>,
}

impl<S, R, N> SyncOrchestrator<S, R, N>
where
    S: LocalStore,
    R: ReservationRemote,
    N: NetworkStatusSource,
{
    /// Create a new orchestrator.
    pub fn new(config: SyncConfig, store: Arc<S>, remote: R, network: Arc<N>) -> Self {
        let (outcomes, _) = broadcast::channel(16);
        Self {
            config,
            store,
            remote,
            network,
            state: Mutex::new(PassState::new()),
            outcomes,
        }
    }

    /// Engine configuration.
    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    /// The local store.
    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// The backend.
    pub fn remote(&self) -> &R {
        &self.remote
    }

    /// The connectivity source.
    pub fn network(&self) -> &Arc<N> {
        &self.network
    }

    /// Current pass lifecycle state.
    pub fn state(&self) -> PassState {
        lock(&self.state).clone()
    }

    /// Whether a pass is in flight.
    pub fn is_syncing(&self) -> bool {
        lock(&self.state).is_syncing()
    }

    /// Subscribe to pass outcomes.
    pub fn subscribe(&self) -> broadcast::Receiver<PassOutcome> {
        self.outcomes.subscribe()
    }

    /// Current status snapshot.
    pub async fn status(&self) -> Result<SyncStatus, StoreError> {
        collect_status(self.store.as_ref(), self.network.as_ref()).await
    }

    /// Run one sync pass.
    pub async fn sync(&self) -> Result<SyncReport, SyncError> {
        let mut guard = self.begin()?;
        let result = self.run_pass().await;

        match &result {
            Ok(report) => guard.finish(PassEvent::Completed {
                synced_count: report.synced_count,
            }),
            Err(e) => guard.finish(PassEvent::Failed {
                error: e.to_string(),
            }),
        }

        result
    }

    fn begin(&self) -> Result<PassGuard<'_>, SyncError> {
        let mut state = lock(&self.state);
        let (next, actions) = state.clone().on_event(PassEvent::Triggered);
        *state = next;

        if actions.contains(&PassAction::RejectBusy) {
            tracing::debug!("Sync already in progress");
            return Err(SyncError::AlreadyRunning);
        }

        Ok(PassGuard {
            state: &self.state,
            outcomes: &self.outcomes,
            finished: false,
        })
    }

    async fn run_pass(&self) -> Result<SyncReport, SyncError> {
        if !self.network.is_online() {
            tracing::info!("Skipping sync: no connectivity");
            return Err(SyncError::NoConnectivity);
        }

        let operations = self.store.list_outbox().await?;
        if operations.is_empty() {
            tracing::debug!("Outbox empty, nothing to sync");
            return Ok(SyncReport::default());
        }

        let now = Utc::now();
        let batch = build_batch(&operations, now);

        for skipped in &batch.skipped {
            tracing::warn!(
                "Outbox entry {} ({}) is not transmitted; only creates sync",
                skipped.op_id,
                skipped.kind.as_str()
            );
        }

        if batch.is_empty() {
            return Ok(SyncReport {
                skipped: batch.skipped,
                ..SyncReport::default()
            });
        }

        let request = BulkSyncRequest {
            reservations: batch.reservations,
        };
        let sent = request.reservations.len() as u32;
        tracing::info!("Syncing {} reservations", sent);

        let response = self.remote.bulk_sync(&request).await?;

        if !response.success {
            let reason = response
                .error
                .or(response.message)
                .unwrap_or_else(|| "unspecified".to_string());
            tracing::warn!("Server rejected sync batch: {}", reason);
            return Err(SyncError::RemoteRejection(reason));
        }

        let mut promoted = Vec::with_capacity(response.mapping.len());
        let mut gaps = Vec::new();

        for mapping in response.mapping {
            match self
                .store
                .promote(&mapping.client_id, &mapping.server_id, now)
                .await?
            {
                Some(_) => {
                    tracing::debug!("Promoted {} -> {}", mapping.client_id, mapping.server_id);
                    promoted.push(mapping);
                }
                None => {
                    tracing::warn!(
                        "No local reservation {} for server id {}",
                        mapping.client_id,
                        mapping.server_id
                    );
                    gaps.push(mapping.client_id);
                }
            }
        }

        self.store.remove_outbox(&batch.submitted).await?;

        let report = SyncReport {
            synced_count: response.synced_count.unwrap_or(sent),
            saved_count: response.saved_count.unwrap_or(promoted.len() as u32),
            message: response.message,
            promoted,
            gaps,
            skipped: batch.skipped,
        };

        tracing::info!(
            "Sync complete: {} synced, {} promoted, {} gaps",
            report.synced_count,
            report.promoted.len(),
            report.gaps.len()
        );
        Ok(report)
    }
}

fn lock(state: &Mutex<PassState>) -> MutexGuard<'_, PassState> {
    state.lock().unwrap_or_else(|e| e.into_inner())
}

/// Marks the pass finished, even if the pass future is dropped mid-flight.
struct PassGuard<'a> {
    state: &'a Mutex<PassState>,
    outcomes: &'a broadcast::Sender<PassOutcome>,
    finished: bool,
}

impl PassGuard<'_> {
    fn finish(&mut self, event: PassEvent) {
        self.finished = true;

        let mut state = lock(self.state);
        let (next, actions) = state.clone().on_event(event);
        *state = next;
        drop(state);

        for action in actions {
            if let PassAction::Emit(outcome) = action {
                let _ = self.outcomes.send(outcome);
            }
        }
    }
}

impl Drop for PassGuard<'_> {
    fn drop(&mut self) {
        if !self.finished {
            self.finish(PassEvent::Failed {
                error: "pass aborted".into(),
            });
        }
    }
}
