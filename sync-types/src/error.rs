//! Error types for the shared data model.

use thiserror::Error;

/// Errors raised while parsing or validating model values.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TypesError {
    /// Unknown reservation status name.
    #[error("invalid reservation status: {0}")]
    InvalidStatus(String),

    /// Unknown request kind name.
    #[error("invalid request kind: {0}")]
    InvalidKind(String),

    /// Record violates a model invariant.
    #[error("invalid reservation: {0}")]
    InvalidReservation(String),
}
