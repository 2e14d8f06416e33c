//! Identity types for reservations.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Prefix carried by every client-generated reservation id.
pub const LOCAL_ID_PREFIX: &str = "local_";

/// Identifier of a reservation.
///
/// A reservation is first keyed by a client-generated id (`local_<uuid>`)
/// and, once the server confirms it, by the server-issued id. The two are
/// mutually exclusive over the life of a record.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReservationId(String);

impl ReservationId {
    /// Generate a new client-side id.
    pub fn new_local() -> Self {
        Self(format!("{}{}", LOCAL_ID_PREFIX, uuid::Uuid::new_v4().simple()))
    }

    /// Wrap an existing id string (client or server).
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Whether this id was generated on the client.
    pub fn is_local(&self) -> bool {
        self.0.starts_with(LOCAL_ID_PREFIX)
    }

    /// Borrow the id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consume into the inner string.
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for ReservationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for ReservationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ReservationId({})", self.0)
    }
}

impl From<&str> for ReservationId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for ReservationId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl AsRef<str> for ReservationId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
