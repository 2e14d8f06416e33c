//! Reachability probing over TCP.

use super::{ConnectivityEvent, NetworkStatusSource, Signal};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

/// Connectivity measured by periodically opening a TCP connection.
///
/// The probe task stops when the source is dropped.
#[derive(Debug)]
pub struct ProbeNetworkSource {
    signal: Arc<Signal>,
    task: JoinHandle<()>,
}

impl ProbeNetworkSource {
    /// Probe `address` (`host:port`) now, then every `interval`.
    ///
    /// The first probe completes before this returns, so `is_online()` is
    /// meaningful immediately.
    pub async fn start(address: String, interval: Duration) -> Self {
        let timeout = probe_timeout(interval);
        let online = probe(&address, timeout).await;
        tracing::info!(
            "Connectivity probe started for {} (interval: {:?}, online: {})",
            address,
            interval,
            online
        );

        let signal = Arc::new(Signal::new(online));
        let task_signal = signal.clone();

        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            // The first tick fires immediately; the initial probe already ran.
            ticker.tick().await;

            loop {
                ticker.tick().await;
                let online = probe(&address, timeout).await;
                if task_signal.update(online) {
                    tracing::info!(
                        "Connectivity changed: {}",
                        if online { "online" } else { "offline" }
                    );
                }
            }
        });

        Self { signal, task }
    }
}

impl Drop for ProbeNetworkSource {
    fn drop(&mut self) {
        self.task.abort();
    }
}

impl NetworkStatusSource for ProbeNetworkSource {
    fn is_online(&self) -> bool {
        self.signal.online.load(std::sync::atomic::Ordering::SeqCst)
    }

    fn subscribe(&self) -> broadcast::Receiver<ConnectivityEvent> {
        self.signal.events.subscribe()
    }
}

fn probe_timeout(interval: Duration) -> Duration {
    interval.min(Duration::from_secs(5))
}

async fn probe(address: &str, timeout: Duration) -> bool {
    match tokio::time::timeout(timeout, TcpStream::connect(address)).await {
        Ok(Ok(_)) => true,
        Ok(Err(e)) => {
            tracing::debug!("Probe to {} failed: {}", address, e);
            false
        }
        Err(_) => {
            tracing::debug!("Probe to {} timed out", address);
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::net::TcpListener;

    #[tokio::test]
    async fn reachable_address_is_online() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap().to_string();

        let source = ProbeNetworkSource::start(addr, Duration::from_secs(60)).await;

        assert!(source.is_online());
    }

    #[tokio::test]
    async fn closed_port_is_offline() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap().to_string();
        drop(listener);

        let source = ProbeNetworkSource::start(addr, Duration::from_secs(60)).await;

        assert!(!source.is_online());
    }

    #[tokio::test]
    async fn losing_the_listener_emits_offline() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap().to_string();
        let source = ProbeNetworkSource::start(addr, Duration::from_millis(20)).await;
        let mut events = source.subscribe();
        assert!(source.is_online());

        drop(listener);

        let event = tokio::time::timeout(Duration::from_secs(5), events.recv())
            .await
            .expect("no connectivity event")
            .unwrap();
        assert_eq!(event, ConnectivityEvent::Offline);
        assert!(!source.is_online());
    }
}
