//! Wiring of store, backend and connectivity for CLI commands.

use anyhow::{Context, Result};
use async_trait::async_trait;
use std::path::Path;
use std::sync::Arc;
use terrace_sync_client::{
    ConnectivityEvent, HttpRemote, ManualNetworkSource, MockRemote, NetworkStatusSource,
    ProbeNetworkSource, RemoteError, ReservationRemote, SqliteStore, SyncOrchestrator,
};
use terrace_sync_types::{BulkSyncRequest, BulkSyncResponse, Reservation};
use tokio::sync::broadcast;

use crate::config::Config;

/// How a command reaches the outside world.
#[derive(Debug, Clone, Copy, Default)]
pub struct Mode {
    /// Use an in-process backend that accepts everything.
    pub mock: bool,
    /// Pretend the device is offline.
    pub offline: bool,
}

/// Backend selected by [`Mode`].
pub enum Backend {
    /// Real HTTP backend.
    Http(HttpRemote),
    /// In-process backend.
    Mock(MockRemote),
}

impl Backend {
    /// Build the backend for `mode`.
    pub fn new(config: &Config, mode: Mode) -> Result<Self> {
        if mode.mock {
            return Ok(Self::Mock(MockRemote::accepting()));
        }
        let remote = HttpRemote::from_config(&config.sync_config())
            .context("Invalid [remote] configuration")?;
        Ok(Self::Http(remote))
    }
}

#[async_trait]
impl ReservationRemote for Backend {
    async fn bulk_sync(&self, request: &BulkSyncRequest) -> Result<BulkSyncResponse, RemoteError> {
        match self {
            Self::Http(remote) => remote.bulk_sync(request).await,
            Self::Mock(remote) => remote.bulk_sync(request).await,
        }
    }

    async fn list_reservations(&self, owner_id: &str) -> Result<Vec<Reservation>, RemoteError> {
        match self {
            Self::Http(remote) => remote.list_reservations(owner_id).await,
            Self::Mock(remote) => remote.list_reservations(owner_id).await,
        }
    }
}

/// Connectivity source selected by [`Mode`].
pub enum Connectivity {
    /// Fixed state (mock or forced offline).
    Manual(ManualNetworkSource),
    /// Reachability of the backend host.
    Probe(ProbeNetworkSource),
}

impl Connectivity {
    /// Build the connectivity source for `mode`.
    pub async fn new(config: &Config, mode: Mode) -> Self {
        if mode.offline {
            return Self::Manual(ManualNetworkSource::new(false));
        }
        if mode.mock {
            return Self::Manual(ManualNetworkSource::new(true));
        }

        let sync = config.sync_config();
        match sync.probe_address() {
            Some(address) => Self::Probe(ProbeNetworkSource::start(address, sync.probe_interval).await),
            None => {
                tracing::warn!("Cannot probe {}, assuming offline", sync.base_url);
                Self::Manual(ManualNetworkSource::new(false))
            }
        }
    }
}

impl NetworkStatusSource for Connectivity {
    fn is_online(&self) -> bool {
        match self {
            Self::Manual(source) => source.is_online(),
            Self::Probe(source) => source.is_online(),
        }
    }

    fn subscribe(&self) -> broadcast::Receiver<ConnectivityEvent> {
        match self {
            Self::Manual(source) => source.subscribe(),
            Self::Probe(source) => source.subscribe(),
        }
    }
}

/// The orchestrator type every command uses.
pub type Engine = SyncOrchestrator<SqliteStore, Backend, Connectivity>;

/// Open the local store for a data directory.
pub async fn open_store(data_dir: &Path, config: &Config) -> Result<Arc<SqliteStore>> {
    let path = config.database_path(data_dir);
    let store = SqliteStore::open(&path)
        .await
        .with_context(|| format!("Failed to open local store at {}", path.display()))?;
    Ok(Arc::new(store))
}

/// Build the full engine for a data directory.
pub async fn open_engine(data_dir: &Path, config: &Config, mode: Mode) -> Result<Arc<Engine>> {
    let store = open_store(data_dir, config).await?;
    let backend = Backend::new(config, mode)?;
    let network = Arc::new(Connectivity::new(config, mode).await);
    Ok(Arc::new(SyncOrchestrator::new(
        config.sync_config(),
        store,
        backend,
        network,
    )))
}
