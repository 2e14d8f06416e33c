//! Sync pass state machine.
//!
//! Pure, side-effect-free lifecycle of the orchestrator:
//! `Idle -> Syncing -> {Succeeded | Failed}`, and back to `Syncing` on the
//! next trigger. A trigger that arrives while a pass is running is rejected,
//! which is what makes overlapping passes a no-op.
//!
//! The actual I/O is performed by sync-client, not by this module.

/// Lifecycle of the sync orchestrator - NO I/O, just state transitions.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum PassState {
    /// No pass has run yet.
    #[default]
    Idle,
    /// A pass is in flight.
    Syncing,
    /// The last pass completed.
    Succeeded {
        /// Number of records the server acknowledged.
        synced_count: u32,
    },
    /// The last pass failed; the outbox was left untouched.
    Failed {
        /// Description of the failure.
        error: String,
    },
}

impl PassState {
    /// Create a new state machine in the Idle state.
    pub fn new() -> Self {
        Self::Idle
    }

    /// Process an event and return the new state plus actions to execute.
    ///
    /// The caller (sync-client) is responsible for executing the actions.
    pub fn on_event(self, event: PassEvent) -> (Self, Vec<PassAction>) {
        match (self, event) {
            (Self::Syncing, PassEvent::Triggered) => (Self::Syncing, vec![PassAction::RejectBusy]),
            (_, PassEvent::Triggered) => (Self::Syncing, vec![PassAction::BeginPass]),

            (Self::Syncing, PassEvent::Completed { synced_count }) => (
                Self::Succeeded { synced_count },
                vec![PassAction::Emit(PassOutcome::Succeeded { synced_count })],
            ),
            (Self::Syncing, PassEvent::Failed { error }) => (
                Self::Failed {
                    error: error.clone(),
                },
                vec![PassAction::Emit(PassOutcome::Failed { error })],
            ),

            // Invalid transitions - stay in current state
            (state, _) => (state, vec![]),
        }
    }

    /// Check if a pass is running.
    pub fn is_syncing(&self) -> bool {
        matches!(self, Self::Syncing)
    }
}

/// Inputs to the pass state machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PassEvent {
    /// Someone asked for a pass (manual or network trigger).
    Triggered,
    /// The pass finished and committed.
    Completed {
        /// Number of records the server acknowledged.
        synced_count: u32,
    },
    /// The pass stopped before committing.
    Failed {
        /// Description of the failure.
        error: String,
    },
}

/// Instructions for sync-client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PassAction {
    /// Proceed with the pass.
    BeginPass,
    /// Another pass is in flight; do nothing.
    RejectBusy,
    /// Report the outcome to observers.
    Emit(PassOutcome),
}

/// Outcome reported when a pass ends.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PassOutcome {
    /// Completed and committed.
    Succeeded {
        /// Number of records the server acknowledged.
        synced_count: u32,
    },
    /// Failed before committing.
    Failed {
        /// Description of the failure.
        error: String,
    },
}
