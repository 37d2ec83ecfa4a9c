//! Persistence of tick results.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use ratepoll_common::ResultSet;
use tracing::debug;

use crate::error::{PollerError, Result};

/// Sink for the result set produced by each tick.
#[async_trait]
pub trait ResultWriter: Send + Sync {
    /// Persist `set`, replacing whatever the previous tick wrote.
    async fn write(&self, set: &ResultSet) -> Result<()>;
}

/// Writes the result set as pretty-printed JSON to a single file.
///
/// Content goes to a sibling `.tmp` file first and is then renamed over the
/// destination, so readers see either the previous tick or the new one.
#[derive(Debug, Clone)]
pub struct JsonFileWriter {
    path: PathBuf,
}

impl JsonFileWriter {
    /// Create a writer targeting `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Destination file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|name| name.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    fn write_error(&self, source: std::io::Error) -> PollerError {
        PollerError::Write {
            path: self.path.clone(),
            source,
        }
    }
}

#[async_trait]
impl ResultWriter for JsonFileWriter {
    async fn write(&self, set: &ResultSet) -> Result<()> {
        let json = serde_json::to_vec_pretty(set).map_err(PollerError::Json)?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| self.write_error(e))?;
        }

        let temp = self.temp_path();
        tokio::fs::write(&temp, &json)
            .await
            .map_err(|e| self.write_error(e))?;
        tokio::fs::rename(&temp, &self.path)
            .await
            .map_err(|e| self.write_error(e))?;

        debug!(
            path = %self.path.display(),
            results = set.results.len(),
            bytes = json.len(),
            "Result set written"
        );
        Ok(())
    }
}

/// Parse a result file written by [`JsonFileWriter`].
pub async fn read_result_set(path: impl AsRef<Path>) -> Result<ResultSet> {
    let path = path.as_ref();
    let bytes = tokio::fs::read(path)
        .await
        .map_err(|source| PollerError::Read {
            path: path.to_path_buf(),
            source,
        })?;
    serde_json::from_slice(&bytes).map_err(PollerError::Json)
}
