//! Connectivity sources.
//!
//! A [`NetworkStatusSource`] answers "are we online right now" and
//! broadcasts transitions. The host supplies one: [`ManualNetworkSource`]
//! when the platform already knows (or in tests), [`ProbeNetworkSource`]
//! when reachability must be measured.

mod probe;

pub use probe::ProbeNetworkSource;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::broadcast;

/// Capacity of the connectivity event channel.
const EVENT_CAPACITY: usize = 32;

/// Connectivity change notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectivityEvent {
    /// The device regained connectivity.
    Online,
    /// The device lost connectivity.
    Offline,
    /// The host finished loading (app start, resume).
    Loaded,
}

/// Source of connectivity state and transitions.
pub trait NetworkStatusSource: Send + Sync {
    /// Current connectivity.
    fn is_online(&self) -> bool;

    /// Subscribe to connectivity events.
    fn subscribe(&self) -> broadcast::Receiver<ConnectivityEvent>;
}

impl<T: NetworkStatusSource + ?Sized> NetworkStatusSource for Arc<T> {
    fn is_online(&self) -> bool {
        (**self).is_online()
    }

    fn subscribe(&self) -> broadcast::Receiver<ConnectivityEvent> {
        (**self).subscribe()
    }
}

/// Shared online flag plus event channel.
#[derive(Debug)]
struct Signal {
    online: AtomicBool,
    events: broadcast::Sender<ConnectivityEvent>,
}

impl Signal {
    fn new(online: bool) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            online: AtomicBool::new(online),
            events,
        }
    }

    /// Store `online` and emit an event if it changed.
    fn update(&self, online: bool) -> bool {
        let previous = self.online.swap(online, Ordering::SeqCst);
        if previous == online {
            return false;
        }
        let event = if online {
            ConnectivityEvent::Online
        } else {
            ConnectivityEvent::Offline
        };
        // No subscribers is fine.
        let _ = self.events.send(event);
        true
    }
}

/// Connectivity driven by the host.
///
/// Clones share state, like the platform listener they stand in for.
#[derive(Debug, Clone)]
pub struct ManualNetworkSource {
    signal: Arc<Signal>,
}

impl ManualNetworkSource {
    /// Create a source with the given initial state.
    pub fn new(online: bool) -> Self {
        Self {
            signal: Arc::new(Signal::new(online)),
        }
    }

    /// Update connectivity. Emits an event only when the state changes.
    pub fn set_online(&self, online: bool) -> bool {
        self.signal.update(online)
    }

    /// Report that the host finished loading.
    pub fn notify_loaded(&self) {
        let _ = self.signal.events.send(ConnectivityEvent::Loaded);
    }
}

impl NetworkStatusSource for ManualNetworkSource {
    fn is_online(&self) -> bool {
        self.signal.online.load(Ordering::SeqCst)
    }

    fn subscribe(&self) -> broadcast::Receiver<ConnectivityEvent> {
        self.signal.events.subscribe()
    }
}
