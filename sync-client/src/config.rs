//! Engine configuration.

use reqwest::Url;
use std::time::Duration;

/// Default per-request timeout for the backend.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
/// Default settle time after an offline to online transition.
pub const DEFAULT_ONLINE_DEBOUNCE: Duration = Duration::from_secs(1);
/// Default delay before the pass that follows a load while online.
pub const DEFAULT_STARTUP_DELAY: Duration = Duration::from_secs(3);
/// Default interval between connectivity probes.
pub const DEFAULT_PROBE_INTERVAL: Duration = Duration::from_secs(15);

/// Configuration for the sync engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncConfig {
    /// Base URL of the reservations backend.
    pub base_url: String,
    /// Optional bearer token for backend requests.
    pub token: Option<String>,
    /// Per-request timeout.
    pub request_timeout: Duration,
    /// Wait after reconnecting before a pass starts.
    pub online_debounce: Duration,
    /// Wait after a load (while online) before a pass starts.
    pub startup_delay: Duration,
    /// How often connectivity is probed.
    pub probe_interval: Duration,
}

impl SyncConfig {
    /// Create a configuration for the given backend.
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.to_string(),
            token: None,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            online_debounce: DEFAULT_ONLINE_DEBOUNCE,
            startup_delay: DEFAULT_STARTUP_DELAY,
            probe_interval: DEFAULT_PROBE_INTERVAL,
        }
    }

    /// Set the bearer token.
    pub fn with_token(mut self, token: &str) -> Self {
        self.token = Some(token.to_string());
        self
    }

    /// Set the request timeout.
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Set the reconnect debounce.
    pub fn with_online_debounce(mut self, debounce: Duration) -> Self {
        self.online_debounce = debounce;
        self
    }

    /// Set the startup delay.
    pub fn with_startup_delay(mut self, delay: Duration) -> Self {
        self.startup_delay = delay;
        self
    }

    /// Set the probe interval.
    pub fn with_probe_interval(mut self, interval: Duration) -> Self {
        self.probe_interval = interval;
        self
    }

    /// `host:port` of the backend, used for reachability probes.
    pub fn probe_address(&self) -> Option<String> {
        let url = Url::parse(&self.base_url).ok()?;
        let host = url.host_str()?;
        let port = url.port_or_known_default()?;
        Some(format!("{}:{}", host, port))
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self::new("http://localhost:3000/api")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = SyncConfig::default();
        assert_eq!(config.online_debounce, Duration::from_secs(1));
        assert_eq!(config.startup_delay, Duration::from_secs(3));
        assert!(config.token.is_none());
    }

    #[test]
    fn builder_overrides() {
        let config = SyncConfig::new("https://api.example.com")
            .with_token("abc")
            .with_request_timeout(Duration::from_secs(5))
            .with_online_debounce(Duration::from_millis(10))
            .with_startup_delay(Duration::ZERO)
            .with_probe_interval(Duration::from_secs(2));

        assert_eq!(config.token.as_deref(), Some("abc"));
        assert_eq!(config.request_timeout, Duration::from_secs(5));
        assert_eq!(config.online_debounce, Duration::from_millis(10));
        assert_eq!(config.startup_delay, Duration::ZERO);
        assert_eq!(config.probe_interval, Duration::from_secs(2));
    }

    #[test]
    fn probe_address_uses_scheme_default_port() {
        assert_eq!(
            SyncConfig::new("https://api.example.com/v1").probe_address(),
            Some("api.example.com:443".to_string())
        );
        assert_eq!(
            SyncConfig::new("http://10.0.0.5:8080").probe_address(),
            Some("10.0.0.5:8080".to_string())
        );
        assert_eq!(SyncConfig::new("nonsense").probe_address(), None);
    }
}
