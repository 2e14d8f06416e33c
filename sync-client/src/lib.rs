//! # sync-client
//!
//! Offline-first reservation sync engine.
//!
//! Reservations are written locally first and queued in a durable outbox.
//! When connectivity allows, a sync pass sends every queued create to the
//! backend in one request and re-keys the local rows under the server ids
//! it returns.
//!
//! ## Features
//!
//! - **Local Store**: SQLite (WAL) or in-memory, behind [`LocalStore`]
//! - **Outbox**: idempotent per op id, durable across restarts
//! - **Single-Flight Passes**: overlapping triggers are rejected, never queued
//! - **Backend Abstraction**: pluggable remote (HTTP, mock)
//! - **Automatic Triggers**: [`NetworkMonitor`] syncs on reconnect and load
//! - **Pure State Machine**: uses sync-core for side-effect-free logic
//!
//! ## Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use terrace_sync_client::{
//!     HttpRemote, ManualNetworkSource, NetworkMonitor, Outbox, SqliteStore, SyncConfig,
//!     SyncOrchestrator,
//! };
//!
//! let config = SyncConfig::new("https://api.example.com/api");
//! let store = Arc::new(SqliteStore::open(path).await?);
//! let remote = HttpRemote::from_config(&config)?;
//! let network = Arc::new(ManualNetworkSource::new(true));
//!
//! // Book offline-first
//! Outbox::new(store.clone()).create_reservation(draft).await?;
//!
//! // Sync now, and again whenever connectivity returns
//! let engine = Arc::new(SyncOrchestrator::new(config, store, remote, network));
//! engine.sync().await?;
//! let _monitor = NetworkMonitor::start(engine.clone());
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod loader;
pub mod monitor;
pub mod network;
pub mod orchestrator;
pub mod outbox;
pub mod remote;
pub mod status;
pub mod store;

pub use config::SyncConfig;
pub use loader::{LoadError, RefreshReport, ReservationLoader};
pub use monitor::NetworkMonitor;
pub use network::{ConnectivityEvent, ManualNetworkSource, NetworkStatusSource, ProbeNetworkSource};
pub use orchestrator::{SyncError, SyncOrchestrator, SyncReport};
pub use outbox::Outbox;
pub use remote::{HttpRemote, MockRemote, RemoteError, ReservationRemote};
pub use status::collect_status;
pub use store::{LocalStore, MemoryStore, SqliteStore, StoreError};
