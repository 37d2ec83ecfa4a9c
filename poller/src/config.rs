//! Process settings.
//!
//! These are fixed for the lifetime of the process. The polling interval
//! and pair list live in the separately watched file (see [`crate::watcher`]).

use std::path::PathBuf;
use std::time::Duration;

use ratepoll_fx::{TransportConfig, DEFAULT_MAX_WORKERS};

/// Main poller configuration.
#[derive(Debug, Clone)]
pub struct PollerConfig {
    /// Path of the watched polling configuration file.
    pub config_path: PathBuf,
    /// Path the result set is written to each tick.
    pub output_path: PathBuf,
    /// Maximum concurrent fetches per tick.
    pub max_workers: usize,
    /// Upstream transport settings.
    pub transport: TransportConfig,
    /// Log level used when `RUST_LOG` is unset.
    pub log_level: String,
    /// Emit JSON log lines instead of human-readable ones.
    pub log_json: bool,
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            config_path: PathBuf::from("config.json"),
            output_path: PathBuf::from("exchange_rates.json"),
            max_workers: DEFAULT_MAX_WORKERS,
            transport: TransportConfig::default(),
            log_level: "info".to_string(),
            log_json: false,
        }
    }
}

impl PollerConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary key lookup on top of the defaults.
    ///
    /// Unparseable numeric values are ignored.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(path) = lookup("RATEPOLL_CONFIG") {
            config.config_path = PathBuf::from(path);
        }

        if let Some(path) = lookup("RATEPOLL_OUTPUT") {
            config.output_path = PathBuf::from(path);
        }

        if let Some(workers) = lookup("RATEPOLL_MAX_WORKERS") {
            if let Ok(workers) = workers.parse() {
                config.max_workers = workers;
            }
        }

        if let Some(retries) = lookup("RATEPOLL_RETRY_COUNT") {
            if let Ok(retries) = retries.parse() {
                config.transport.retry.max_retries = retries;
            }
        }

        if let Some(millis) = lookup("RATEPOLL_BACKOFF_MS") {
            if let Ok(millis) = millis.parse() {
                config.transport.retry.backoff_base = Duration::from_millis(millis);
            }
        }

        if let Some(secs) = lookup("RATEPOLL_REQUEST_TIMEOUT_SECS") {
            if let Ok(secs) = secs.parse() {
                config.transport.request_timeout = Duration::from_secs(secs);
            }
        }

        if let Some(url) = lookup("RATEPOLL_SOURCE_URL") {
            config.transport.base_url = url;
        }

        if let Some(level) = lookup("LOG_LEVEL") {
            config.log_level = level;
        }

        config
    }

    /// Validate configuration.
    pub fn validate(&self) -> Result<(), String> {
        if self.max_workers == 0 {
            return Err("Max workers cannot be 0".to_string());
        }

        if self.transport.base_url.trim().is_empty() {
            return Err("Source URL cannot be empty".to_string());
        }

        if self.transport.request_timeout.is_zero() {
            return Err("Request timeout cannot be 0".to_string());
        }

        if self.output_path.as_os_str().is_empty() {
            return Err("Output path cannot be empty".to_string());
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_default_config() {
        let config = PollerConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.max_workers, 5);
        assert_eq!(config.transport.retry.max_retries, 3);
        assert_eq!(config.transport.request_timeout, Duration::from_secs(10));
    }

    #[test]
    fn test_env_overrides() {
        let config = PollerConfig::from_lookup(lookup_from(&[
            ("RATEPOLL_CONFIG", "/etc/ratepoll/pairs.json"),
            ("RATEPOLL_OUTPUT", "/var/lib/ratepoll/rates.json"),
            ("RATEPOLL_MAX_WORKERS", "8"),
            ("RATEPOLL_RETRY_COUNT", "1"),
            ("RATEPOLL_BACKOFF_MS", "250"),
            ("RATEPOLL_REQUEST_TIMEOUT_SECS", "3"),
            ("RATEPOLL_SOURCE_URL", "http://localhost:9000/convert"),
            ("LOG_LEVEL", "debug"),
        ]));

        assert_eq!(config.config_path, PathBuf::from("/etc/ratepoll/pairs.json"));
        assert_eq!(config.output_path, PathBuf::from("/var/lib/ratepoll/rates.json"));
        assert_eq!(config.max_workers, 8);
        assert_eq!(config.transport.retry.max_retries, 1);
        assert_eq!(config.transport.retry.backoff_base, Duration::from_millis(250));
        assert_eq!(config.transport.request_timeout, Duration::from_secs(3));
        assert_eq!(config.transport.base_url, "http://localhost:9000/convert");
        assert_eq!(config.log_level, "debug");
    }

    #[test]
    fn test_unparseable_numbers_ignored() {
        let config = PollerConfig::from_lookup(lookup_from(&[
            ("RATEPOLL_MAX_WORKERS", "many"),
            ("RATEPOLL_BACKOFF_MS", "-1"),
        ]));
        assert_eq!(config.max_workers, DEFAULT_MAX_WORKERS);
        assert_eq!(config.transport.retry.backoff_base, Duration::from_millis(100));
    }

    #[test]
    fn test_invalid_config() {
        let mut config = PollerConfig::default();
        config.max_workers = 0;
        assert!(config.validate().is_err());

        let mut config = PollerConfig::default();
        config.transport.base_url = String::new();
        assert!(config.validate().is_err());

        let mut config = PollerConfig::default();
        config.transport.request_timeout = Duration::ZERO;
        assert!(config.validate().is_err());
    }
}
