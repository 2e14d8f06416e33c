//! Configuration loading for terrace-sync.
//!
//! Configuration is loaded from a TOML file (default: `terrace.toml` in the
//! data directory). Every field has a default; a missing file means
//! "all defaults".

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use terrace_sync_client::SyncConfig;

/// File name looked up in the data directory.
pub const CONFIG_FILE: &str = "terrace.toml";

/// Root configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// Reservations backend.
    #[serde(default)]
    pub remote: RemoteConfig,
    /// Local store.
    #[serde(default)]
    pub storage: StorageConfig,
    /// Automatic sync triggers.
    #[serde(default)]
    pub monitor: MonitorConfig,
}

/// Reservations backend configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct RemoteConfig {
    /// Base URL (default: http://localhost:3000/api).
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Request timeout in seconds (default: 30).
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Bearer token (optional).
    pub token: Option<String>,
}

/// Local store configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// SQLite database file, relative to the data directory unless absolute
    /// (default: reservations.db).
    #[serde(default = "default_database")]
    pub database: PathBuf,
}

/// Automatic sync trigger configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct MonitorConfig {
    /// Settle time after reconnecting, in milliseconds (default: 1000).
    #[serde(default = "default_online_debounce_ms")]
    pub online_debounce_ms: u64,
    /// Delay before the startup pass, in milliseconds (default: 3000).
    #[serde(default = "default_startup_delay_ms")]
    pub startup_delay_ms: u64,
    /// Connectivity probe interval in seconds (default: 15).
    #[serde(default = "default_probe_interval_secs")]
    pub probe_interval_secs: u64,
}

// Default value functions
fn default_base_url() -> String {
    "http://localhost:3000/api".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_database() -> PathBuf {
    PathBuf::from("reservations.db")
}

fn default_online_debounce_ms() -> u64 {
    1000
}

fn default_startup_delay_ms() -> u64 {
    3000
}

fn default_probe_interval_secs() -> u64 {
    15
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
            token: None,
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database: default_database(),
        }
    }
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            online_debounce_ms: default_online_debounce_ms(),
            startup_delay_ms: default_startup_delay_ms(),
            probe_interval_secs: default_probe_interval_secs(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            source: e,
        })?;

        toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            source: e,
        })
    }

    /// Load configuration, falling back to defaults when the file is absent.
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            Self::from_file(path)
        } else {
            tracing::debug!("No config at {}, using defaults", path.display());
            Ok(Self::default())
        }
    }

    /// Database location for a data directory.
    pub fn database_path(&self, data_dir: &Path) -> PathBuf {
        if self.storage.database.is_absolute() {
            self.storage.database.clone()
        } else {
            data_dir.join(&self.storage.database)
        }
    }

    /// Engine configuration.
    pub fn sync_config(&self) -> SyncConfig {
        let config = SyncConfig::new(&self.remote.base_url)
            .with_request_timeout(Duration::from_secs(self.remote.timeout_secs))
            .with_online_debounce(Duration::from_millis(self.monitor.online_debounce_ms))
            .with_startup_delay(Duration::from_millis(self.monitor.startup_delay_ms))
            .with_probe_interval(Duration::from_secs(self.monitor.probe_interval_secs.max(1)));

        match &self.remote.token {
            Some(token) => config.with_token(token),
            None => config,
        }
    }
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read configuration file.
    #[error("failed to read config file {path}: {source}")]
    ReadError {
        /// Path to the configuration file.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },
    /// Failed to parse configuration file.
    #[error("failed to parse config file {path}: {source}")]
    ParseError {
        /// Path to the configuration file.
        path: PathBuf,
        /// Underlying TOML parse error.
        source: toml::de::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn default_config_is_valid() {
        let config = Config::default();
        assert_eq!(config.remote.base_url, "http://localhost:3000/api");
        assert_eq!(config.monitor.online_debounce_ms, 1000);
        assert_eq!(config.monitor.startup_delay_ms, 3000);
        assert_eq!(config.storage.database, PathBuf::from("reservations.db"));
    }

    #[test]
    fn config_from_toml_string() {
        let toml = r#"
[remote]
base_url = "https://api.terraces.example/api"
timeout_secs = 10
token = "secret"

[storage]
database = "/var/lib/terrace/reservations.db"

[monitor]
online_debounce_ms = 250
probe_interval_secs = 5
"#;

        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.remote.base_url, "https://api.terraces.example/api");
        assert_eq!(config.remote.timeout_secs, 10);
        assert_eq!(config.remote.token.as_deref(), Some("secret"));
        assert_eq!(
            config.storage.database,
            PathBuf::from("/var/lib/terrace/reservations.db")
        );
        assert_eq!(config.monitor.online_debounce_ms, 250);
        assert_eq!(config.monitor.startup_delay_ms, 3000);
        assert_eq!(config.monitor.probe_interval_secs, 5);
    }

    #[test]
    fn empty_file_uses_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.remote.timeout_secs, 30);
        assert_eq!(config.monitor.probe_interval_secs, 15);
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let dir = tempdir().unwrap();
        let config = Config::load_or_default(&dir.path().join(CONFIG_FILE)).unwrap();
        assert_eq!(config.remote.base_url, default_base_url());
    }

    #[test]
    fn invalid_file_is_parse_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        std::fs::write(&path, "[remote\nbase_url = 1").unwrap();

        let result = Config::load_or_default(&path);
        assert!(matches!(result, Err(ConfigError::ParseError { .. })));
    }

    #[test]
    fn relative_database_resolves_under_data_dir() {
        let config = Config::default();
        assert_eq!(
            config.database_path(Path::new("/data")),
            PathBuf::from("/data/reservations.db")
        );
    }

    #[test]
    fn sync_config_carries_monitor_settings() {
        let mut config = Config::default();
        config.monitor.online_debounce_ms = 50;
        config.remote.token = Some("t".into());

        let sync = config.sync_config();

        assert_eq!(sync.online_debounce, Duration::from_millis(50));
        assert_eq!(sync.startup_delay, Duration::from_secs(3));
        assert_eq!(sync.token.as_deref(), Some("t"));
    }
}
