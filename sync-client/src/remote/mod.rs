//! Reservations backend abstraction.
//!
//! Provides a trait for the bulk-sync and list endpoints plus an HTTP
//! implementation and a mock for testing.

mod http;
mod mock;

pub use http::HttpRemote;
pub use mock::MockRemote;

use async_trait::async_trait;
use terrace_sync_types::{BulkSyncRequest, BulkSyncResponse, Reservation};

/// Errors that can occur talking to the reservations backend.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RemoteError {
    /// The request did not complete (connection refused, reset, DNS).
    #[error("network error: {0}")]
    Network(String),

    /// The request exceeded the configured timeout.
    #[error("request timed out")]
    Timeout,

    /// The server answered with a non-success status and no usable body.
    #[error("server returned {status}: {body}")]
    Http {
        /// HTTP status code.
        status: u16,
        /// Response body, possibly truncated.
        body: String,
    },

    /// The response body could not be decoded.
    #[error("invalid response: {0}")]
    Decode(String),

    /// The configured base URL is not usable.
    #[error("invalid base url: {0}")]
    InvalidUrl(String),
}

/// Reservations backend.
///
/// Implementations must be cheap to share across tasks.
#[async_trait]
pub trait ReservationRemote: Send + Sync {
    /// Submit a batch of new reservations in one request.
    ///
    /// A response with `success == false` is returned as `Ok`; only a request
    /// that could not complete is an error.
    async fn bulk_sync(&self, request: &BulkSyncRequest) -> Result<BulkSyncResponse, RemoteError>;

    /// Fetch the server view of an owner's reservations.
    async fn list_reservations(&self, owner_id: &str) -> Result<Vec<Reservation>, RemoteError>;
}
