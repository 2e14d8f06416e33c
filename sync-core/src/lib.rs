//! # sync-core
//!
//! Pure logic for the terrace reservation sync engine (no I/O, instant tests).
//!
//! This crate implements the state machine and algorithms for a sync pass
//! without any network or disk I/O, enabling fast unit tests.
//!
//! ## Design Philosophy
//!
//! All modules in this crate are **pure** - they take input and produce output
//! without side effects:
//! - [`normalize`] builds the bulk-sync batch with total defaulting
//! - [`merge`] folds a server listing into local state
//! - [`state`] tracks the `Idle -> Syncing -> Succeeded/Failed` lifecycle
//! - [`status`] aggregates counts for UI badges
//!
//! The actual I/O (storage, network) is performed by `sync-client`, which
//! interprets the actions produced here.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod merge;
pub mod normalize;
pub mod state;
pub mod status;

pub use merge::merge_server_view;
pub use normalize::{
    build_batch, default_duration_hours, normalize_reservation, Batch, SkippedOperation,
    DEFAULT_GUEST_COUNT, EVENT_DURATION_HOURS, UNASSIGNED_TERRACE_ID, VISIT_DURATION_HOURS,
};
pub use state::{PassAction, PassEvent, PassOutcome, PassState};
pub use status::SyncStatus;
