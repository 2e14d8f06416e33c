//! Automatic sync triggers.
//!
//! The monitor listens to a connectivity source and starts passes:
//! - after an offline to online transition, once the connection has been
//!   up for `online_debounce`
//! - after a load while online, once `startup_delay` has elapsed
//!
//! Triggered passes are fire-and-forget; their outcome is logged. A pass
//! that has started is never cancelled by later events.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;

use crate::network::{ConnectivityEvent, NetworkStatusSource};
use crate::orchestrator::{SyncError, SyncOrchestrator};
use crate::remote::ReservationRemote;
use crate::store::LocalStore;

/// Background task that triggers passes on connectivity changes.
///
/// Stops when dropped.
#[derive(Debug)]
pub struct NetworkMonitor {
    task: Option<JoinHandle<()>>,
}

impl NetworkMonitor {
    /// Start listening on the orchestrator's connectivity source.
    pub fn start<S, R, N>(orchestrator: Arc<SyncOrchestrator<S, R, N>>) -> Self
    where
        S: LocalStore + 'static,
        R: ReservationRemote + 'static,
        N: NetworkStatusSource + 'static,
    {
        let network = orchestrator.network().clone();
        // Subscribe before reading the current state so no transition is lost.
        let mut events = network.subscribe();
        let debounce = orchestrator.config().online_debounce;
        let startup_delay = orchestrator.config().startup_delay;

        let task = tokio::spawn(async move {
            let mut online = network.is_online();
            let mut pending: Option<JoinHandle<()>> = None;

            tracing::info!(
                "Network monitor started (online: {}, debounce: {:?})",
                online,
                debounce
            );

            if online {
                pending = Some(schedule(orchestrator.clone(), startup_delay, "startup"));
            }

            loop {
                let event = match events.recv().await {
                    Ok(event) => event,
                    Err(RecvError::Lagged(skipped)) => {
                        tracing::warn!("Network monitor missed {} events", skipped);
                        // Resynchronize from the current state.
                        if network.is_online() {
                            ConnectivityEvent::Online
                        } else {
                            ConnectivityEvent::Offline
                        }
                    }
                    Err(RecvError::Closed) => break,
                };

                match event {
                    ConnectivityEvent::Online if !online => {
                        online = true;
                        tracing::info!("Connectivity restored");
                        replace(&mut pending, schedule(orchestrator.clone(), debounce, "reconnect"));
                    }
                    ConnectivityEvent::Online => {}
                    ConnectivityEvent::Offline => {
                        if online {
                            tracing::info!("Connectivity lost");
                        }
                        online = false;
                        if let Some(handle) = pending.take() {
                            handle.abort();
                        }
                    }
                    ConnectivityEvent::Loaded => {
                        online = network.is_online();
                        if online {
                            replace(&mut pending, schedule(orchestrator.clone(), startup_delay, "load"));
                        }
                    }
                }
            }

            tracing::debug!("Network monitor stopped: event source closed");
        });

        Self { task: Some(task) }
    }

    /// Stop listening. A pass already running is not interrupted.
    pub fn stop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }

    /// Whether the listener task is still running.
    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|t| !t.is_finished())
    }
}

impl Drop for NetworkMonitor {
    fn drop(&mut self) {
        self.stop();
    }
}

fn replace(pending: &mut Option<JoinHandle<()>>, next: JoinHandle<()>) {
    if let Some(previous) = pending.replace(next) {
        previous.abort();
    }
}

/// Wait `delay`, then start a detached pass.
///
/// Aborting the returned handle cancels the wait, never the pass.
fn schedule<S, R, N>(
    orchestrator: Arc<SyncOrchestrator<S, R, N>>,
    delay: Duration,
    reason: &'static str,
) -> JoinHandle<()>
where
    S: LocalStore + 'static,
    R: ReservationRemote + 'static,
    N: NetworkStatusSource + 'static,
{
    tokio::spawn(async move {
        tokio::time::sleep(delay).await;
        tokio::spawn(run_pass(orchestrator, reason));
    })
}

async fn run_pass<S, R, N>(orchestrator: Arc<SyncOrchestrator<S, R, N>>, reason: &'static str)
where
    S: LocalStore,
    R: ReservationRemote,
    N: NetworkStatusSource,
{
    match orchestrator.sync().await {
        Ok(report) if report.is_noop() => {
            tracing::debug!("Sync ({}): nothing to send", reason);
        }
        Ok(report) => {
            tracing::info!(
                "Sync ({}): {} synced, {} promoted",
                reason,
                report.synced_count,
                report.promoted.len()
            );
        }
        Err(e @ (SyncError::AlreadyRunning | SyncError::NoConnectivity)) => {
            tracing::debug!("Sync ({}) skipped: {}", reason, e);
        }
        Err(e) => {
            tracing::error!("Sync ({}) failed: {}", reason, e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SyncConfig;
    use crate::network::ManualNetworkSource;
    use crate::remote::MockRemote;
    use crate::store::fixtures::local_reservation;
    use crate::store::MemoryStore;
    use chrono::Utc;
    use terrace_sync_types::OutboxOperation;

    type Orch = SyncOrchestrator<MemoryStore, MockRemote, ManualNetworkSource>;

    async fn setup(online: bool, config: SyncConfig) -> (Arc<Orch>, MockRemote, ManualNetworkSource) {
        let store = MemoryStore::new();
        let r = local_reservation("local_1");
        store
            .stage_create(&r, &OutboxOperation::create(r.clone(), Utc::now()))
            .await
            .unwrap();
        let remote = MockRemote::accepting();
        let network = ManualNetworkSource::new(online);
        let orch = Arc::new(SyncOrchestrator::new(
            config,
            Arc::new(store),
            remote.clone(),
            Arc::new(network.clone()),
        ));
        (orch, remote, network)
    }

    fn fast_config() -> SyncConfig {
        SyncConfig::default()
            .with_online_debounce(Duration::from_millis(30))
            .with_startup_delay(Duration::from_millis(30))
    }

    async fn wait_for_calls(remote: &MockRemote, calls: usize) -> bool {
        for _ in 0..200 {
            if remote.bulk_calls() >= calls {
                return true;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        false
    }

    #[tokio::test]
    async fn reconnect_triggers_a_pass_after_debounce() {
        let (orch, remote, network) = setup(false, fast_config()).await;
        let _monitor = NetworkMonitor::start(orch.clone());
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(remote.bulk_calls(), 0);

        network.set_online(true);

        assert!(wait_for_calls(&remote, 1).await);
        assert!(wait_until_drained(&orch).await);
    }

    async fn wait_until_drained(orch: &Orch) -> bool {
        for _ in 0..200 {
            if orch.store().outbox_len().await.unwrap() == 0 {
                return true;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        false
    }

    #[tokio::test]
    async fn online_at_start_triggers_after_startup_delay() {
        let (orch, remote, _network) = setup(true, fast_config()).await;

        let _monitor = NetworkMonitor::start(orch.clone());

        assert!(wait_for_calls(&remote, 1).await);
    }

    #[tokio::test]
    async fn offline_at_start_does_nothing() {
        let (orch, remote, _network) = setup(false, fast_config()).await;

        let _monitor = NetworkMonitor::start(orch);
        tokio::time::sleep(Duration::from_millis(150)).await;

        assert_eq!(remote.bulk_calls(), 0);
    }

    #[tokio::test]
    async fn flapping_inside_debounce_is_cancelled() {
        let config = SyncConfig::default()
            .with_online_debounce(Duration::from_millis(100))
            .with_startup_delay(Duration::from_millis(100));
        let (orch, remote, network) = setup(false, config).await;
        let _monitor = NetworkMonitor::start(orch);
        tokio::time::sleep(Duration::from_millis(10)).await;

        network.set_online(true);
        tokio::time::sleep(Duration::from_millis(10)).await;
        network.set_online(false);
        tokio::time::sleep(Duration::from_millis(250)).await;

        assert_eq!(remote.bulk_calls(), 0);
    }

    #[tokio::test]
    async fn loaded_while_online_triggers_another_pass() {
        let (orch, remote, network) = setup(true, fast_config()).await;
        let _monitor = NetworkMonitor::start(orch.clone());
        assert!(wait_for_calls(&remote, 1).await);
        assert!(wait_until_drained(&orch).await);

        let r = local_reservation("local_2");
        orch.store()
            .stage_create(&r, &OutboxOperation::create(r.clone(), Utc::now()))
            .await
            .unwrap();
        network.notify_loaded();

        assert!(wait_for_calls(&remote, 2).await);
    }

    #[tokio::test]
    async fn stopped_monitor_ignores_events() {
        let (orch, remote, network) = setup(false, fast_config()).await;
        let mut monitor = NetworkMonitor::start(orch);
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert!(monitor.is_running());

        monitor.stop();
        network.set_online(true);
        tokio::time::sleep(Duration::from_millis(150)).await;

        assert!(!monitor.is_running());
        assert_eq!(remote.bulk_calls(), 0);
    }
}
