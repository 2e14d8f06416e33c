//! # sync-types
//!
//! Shared data model for the terrace reservation sync engine.
//!
//! This crate provides the types used across all terrace-sync crates:
//! - [`Reservation`], [`ReservationId`] - The record being synchronized
//! - [`OutboxOperation`], [`MappingEntry`] - Outbox and reconciliation metadata
//! - [`BulkSyncRequest`], [`BulkSyncResponse`] - Backend wire format
//! - [`TypesError`] - Parse and validation errors

#![warn(missing_docs)]
#![warn(clippy::all)]

mod error;
mod ids;
mod messages;
mod outbox;
mod reservation;

pub use error::TypesError;
pub use ids::{ReservationId, LOCAL_ID_PREFIX};
pub use messages::{BulkSyncRequest, BulkSyncResponse, IdMapping, NormalizedReservation};
pub use outbox::{MappingEntry, OperationKind, OutboxOperation};
pub use reservation::{
    EventDetails, RequestKind, Reservation, ReservationDraft, ReservationPatch, ReservationStatus,
};
