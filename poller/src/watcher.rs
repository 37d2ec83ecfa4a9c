//! Live reloading of the polling configuration file.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::SystemTime;

use parking_lot::{Mutex, RwLock};
use tracing::{info, warn};

use crate::error::ConfigError;
use crate::fetch_config::FetchConfig;

/// Result of a reload check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReloadOutcome {
    /// Modification time unchanged; nothing was read.
    Unchanged,
    /// New content was valid and is now active.
    Reloaded,
    /// New content was invalid; the previous configuration stays active.
    Rejected,
}

/// Read and validate a configuration file.
pub async fn load_fetch_config(path: &Path) -> Result<FetchConfig, ConfigError> {
    let text = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
    FetchConfig::parse(&text)
}

async fn modified_time(path: &Path) -> std::io::Result<SystemTime> {
    tokio::fs::metadata(path).await?.modified()
}

/// Holds the active [`FetchConfig`] and swaps in new versions of the file.
///
/// Readers take an `Arc` snapshot via [`ConfigWatcher::current`]; a reload
/// replaces that `Arc` as a whole, so no reader sees a partial update.
pub struct ConfigWatcher {
    path: PathBuf,
    active: RwLock<Arc<FetchConfig>>,
    last_modified: Mutex<Option<SystemTime>>,
}

impl ConfigWatcher {
    /// Perform the initial load. Failure here must stop the process.
    pub async fn load(path: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let path = path.into();
        // Taken before the read so an edit racing the load is picked up next check.
        let modified = modified_time(&path).await.ok();
        let config = load_fetch_config(&path).await?;

        info!(
            path = %path.display(),
            interval_seconds = config.interval_seconds,
            pairs = config.currency_pairs.len(),
            "Loaded polling configuration"
        );

        Ok(Self {
            path,
            active: RwLock::new(Arc::new(config)),
            last_modified: Mutex::new(modified),
        })
    }

    /// Path of the watched file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Snapshot of the active configuration.
    pub fn current(&self) -> Arc<FetchConfig> {
        self.active.read().clone()
    }

    /// Check whether the file's modification time differs from the last one seen.
    pub async fn check_for_change(&self) -> bool {
        self.changed_marker().await.is_some()
    }

    /// Reload the file if it changed since the last check.
    ///
    /// The modification marker advances even when the new content is
    /// rejected, so a bad edit is reported once rather than on every tick.
    pub async fn reload_if_changed(&self) -> ReloadOutcome {
        let Some(modified) = self.changed_marker().await else {
            return ReloadOutcome::Unchanged;
        };
        *self.last_modified.lock() = Some(modified);

        match load_fetch_config(&self.path).await {
            Ok(config) => {
                info!(
                    path = %self.path.display(),
                    interval_seconds = config.interval_seconds,
                    pairs = config.currency_pairs.len(),
                    "Polling configuration reloaded"
                );
                *self.active.write() = Arc::new(config);
                ReloadOutcome::Reloaded
            }
            Err(e) => {
                warn!(
                    path = %self.path.display(),
                    kind = ?e.kind(),
                    error = %e,
                    "Invalid configuration, keeping previous"
                );
                ReloadOutcome::Rejected
            }
        }
    }

    /// New modification time, if it differs from the recorded one.
    async fn changed_marker(&self) -> Option<SystemTime> {
        match modified_time(&self.path).await {
            Ok(modified) if *self.last_modified.lock() != Some(modified) => Some(modified),
            Ok(_) => None,
            Err(e) => {
                warn!(
                    path = %self.path.display(),
                    error = %e,
                    "Cannot stat configuration file, keeping previous"
                );
                None
            }
        }
    }
}
