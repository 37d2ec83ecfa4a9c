//! The polling loop.

use std::sync::Arc;
use std::time::Instant;

use parking_lot::RwLock;
use ratepoll_common::{now, ResultSet};
use ratepoll_fx::FetchWorkerPool;
use tokio::sync::mpsc;
use tracing::{error, info, instrument};

use crate::error::{PollerError, Result};
use crate::metrics::{PollMetrics, SharedMetrics};
use crate::state::SchedulerState;
use crate::watcher::ConfigWatcher;
use crate::writer::ResultWriter;

/// Drives one tick at a time: reload check, fetch, write, sleep.
///
/// Ticks never overlap. A tick that outlasts the interval delays the next
/// one; there is no catch-up.
pub struct PollScheduler {
    /// Source of the active polling configuration.
    watcher: Arc<ConfigWatcher>,
    /// Fetch pool shared across ticks.
    pool: Arc<FetchWorkerPool>,
    /// Result sink.
    writer: Arc<dyn ResultWriter>,
    /// Activity counters.
    metrics: SharedMetrics,
    /// Current lifecycle state.
    state: Arc<RwLock<SchedulerState>>,
    /// Shutdown signal sender.
    shutdown_tx: mpsc::Sender<()>,
    /// Shutdown signal receiver, taken by the first `run`.
    shutdown_rx: Arc<RwLock<Option<mpsc::Receiver<()>>>>,
}

impl PollScheduler {
    /// Create a new scheduler.
    pub fn new(
        watcher: ConfigWatcher,
        pool: FetchWorkerPool,
        writer: Arc<dyn ResultWriter>,
    ) -> Self {
        let (shutdown_tx, shutdown_rx) = mpsc::channel(1);

        Self {
            watcher: Arc::new(watcher),
            pool: Arc::new(pool),
            writer,
            metrics: Arc::new(PollMetrics::new()),
            state: Arc::new(RwLock::new(SchedulerState::Starting)),
            shutdown_tx,
            shutdown_rx: Arc::new(RwLock::new(Some(shutdown_rx))),
        }
    }

    /// Get the current scheduler state.
    pub fn state(&self) -> SchedulerState {
        *self.state.read()
    }

    /// Activity counters.
    pub fn metrics(&self) -> &SharedMetrics {
        &self.metrics
    }

    /// Configuration watcher.
    pub fn watcher(&self) -> &ConfigWatcher {
        &self.watcher
    }

    /// Run ticks until [`PollScheduler::stop`] is called.
    ///
    /// The stop signal is only observed while sleeping between ticks, so a
    /// tick in progress always completes and writes its results.
    #[instrument(skip(self))]
    pub async fn run(&self) -> Result<()> {
        let mut shutdown_rx = self
            .shutdown_rx
            .write()
            .take()
            .ok_or(PollerError::AlreadyRunning)?;

        {
            let mut state = self.state.write();
            if state.is_shutting_down() {
                *state = SchedulerState::Stopped;
                return Ok(());
            }
            *state = SchedulerState::Running;
        }

        info!(
            config = %self.watcher.path().display(),
            max_workers = self.pool.max_workers(),
            "Poll scheduler started"
        );

        loop {
            self.tick().await;

            let interval = self.watcher.current().interval();
            tokio::select! {
                _ = tokio::time::sleep(interval) => {}
                _ = shutdown_rx.recv() => break,
            }
        }

        *self.state.write() = SchedulerState::Stopped;

        let snapshot = self.metrics.snapshot();
        info!(
            ticks = snapshot.ticks_total,
            rates_fetched = snapshot.rates_fetched,
            rates_failed = snapshot.rates_failed,
            "Poll scheduler stopped"
        );
        Ok(())
    }

    /// Request the loop to stop after the current tick.
    #[instrument(skip(self))]
    pub fn stop(&self) {
        {
            let mut state = self.state.write();
            if state.is_shutting_down() {
                return;
            }
            *state = SchedulerState::Stopping;
        }

        info!("Stopping poll scheduler");
        // Full channel means a stop is already pending.
        let _ = self.shutdown_tx.try_send(());
    }

    /// Run a single tick and return the result set it produced.
    ///
    /// A failed write is logged and counted; the result set is still
    /// returned.
    #[instrument(skip(self))]
    pub async fn tick(&self) -> ResultSet {
        let outcome = self.watcher.reload_if_changed().await;
        self.metrics.reload_checked(outcome);

        let config = self.watcher.current();
        let started = Instant::now();

        let results = self.pool.run(&config.currency_pairs).await;
        let set = ResultSet::new(now(), results);

        if let Err(e) = self.writer.write(&set).await {
            self.metrics.write_failed();
            error!(error = %e, "Failed to write result set");
        }
        self.metrics.tick_completed(&set);

        info!(
            pairs = set.results.len(),
            succeeded = set.success_count(),
            failed = set.failure_count(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            next_in_secs = config.interval_seconds,
            "Tick complete"
        );

        set
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::path::{Path, PathBuf};
    use std::time::{Duration, SystemTime};

    use async_trait::async_trait;
    use parking_lot::Mutex;
    use ratepoll_common::CurrencyPair;
    use ratepoll_fx::{FetchError, MarkupRateExtractor, MockTransport};
    use tempfile::TempDir;

    #[derive(Default)]
    struct MemoryWriter {
        sets: Mutex<Vec<ResultSet>>,
        fail: bool,
    }

    impl MemoryWriter {
        fn failing() -> Self {
            Self {
                fail: true,
                ..Self::default()
            }
        }

        fn count(&self) -> usize {
            self.sets.lock().len()
        }
    }

    #[async_trait]
    impl ResultWriter for MemoryWriter {
        async fn write(&self, set: &ResultSet) -> Result<()> {
            if self.fail {
                return Err(PollerError::Write {
                    path: PathBuf::from("/unwritable/rates.json"),
                    source: std::io::Error::new(std::io::ErrorKind::Other, "disk full"),
                });
            }
            self.sets.lock().push(set.clone());
            Ok(())
        }
    }

    fn pair(from: &str, to: &str) -> CurrencyPair {
        CurrencyPair::parse(from, to).unwrap()
    }

    fn write_config(path: &Path, contents: &str, offset_secs: u64) {
        std::fs::write(path, contents).unwrap();
        let modified =
            SystemTime::UNIX_EPOCH + Duration::from_secs(1_700_000_000 + offset_secs);
        File::options()
            .write(true)
            .open(path)
            .unwrap()
            .set_modified(modified)
            .unwrap();
    }

    async fn scheduler_for(
        dir: &TempDir,
        contents: &str,
        transport: Arc<MockTransport>,
        writer: Arc<MemoryWriter>,
    ) -> PollScheduler {
        let path = dir.path().join("config.json");
        write_config(&path, contents, 0);

        let watcher = ConfigWatcher::load(&path).await.unwrap();
        let extractor = Arc::new(MarkupRateExtractor::standard().unwrap());
        let pool = FetchWorkerPool::new(transport, extractor, 5);
        PollScheduler::new(watcher, pool, writer)
    }

    fn triples(set: &ResultSet) -> Vec<(String, String, Option<f64>)> {
        set.results
            .iter()
            .map(|r| (r.from.to_string(), r.to.to_string(), r.rate))
            .collect()
    }

    #[tokio::test]
    async fn test_tick_records_partial_failure() {
        let dir = tempfile::tempdir().unwrap();
        let transport = Arc::new(MockTransport::new());
        transport.set_rate_text(pair("EUR", "GBP"), "1.2345");
        transport.set_error(
            pair("USD", "EUR"),
            FetchError::Http {
                status: 503,
                attempts: 4,
            },
        );
        let writer = Arc::new(MemoryWriter::default());

        let scheduler = scheduler_for(
            &dir,
            r#"{"interval_seconds": 60, "currency_pairs": [["EUR", "GBP"], ["USD", "EUR"]]}"#,
            transport,
            writer.clone(),
        )
        .await;

        let set = scheduler.tick().await;

        assert_eq!(
            triples(&set),
            vec![
                ("EUR".to_string(), "GBP".to_string(), Some(1.2345)),
                ("USD".to_string(), "EUR".to_string(), None),
            ]
        );
        assert_eq!(writer.count(), 1);
        assert_eq!(writer.sets.lock()[0], set);

        let snapshot = scheduler.metrics().snapshot();
        assert_eq!(snapshot.ticks_total, 1);
        assert_eq!(snapshot.rates_fetched, 1);
        assert_eq!(snapshot.rates_failed, 1);
    }

    #[tokio::test]
    async fn test_reload_between_ticks() {
        let dir = tempfile::tempdir().unwrap();
        let transport = Arc::new(MockTransport::new());
        transport.set_rate_text(pair("EUR", "GBP"), "0.8561");
        transport.set_rate_text(pair("GBP", "USD"), "1.2701");
        let writer = Arc::new(MemoryWriter::default());

        let scheduler = scheduler_for(
            &dir,
            r#"{"interval_seconds": 60, "currency_pairs": [["EUR", "GBP"]]}"#,
            transport.clone(),
            writer,
        )
        .await;

        let first = scheduler.tick().await;
        assert_eq!(first.results.len(), 1);

        write_config(
            scheduler.watcher().path(),
            r#"{"interval_seconds": 30, "currency_pairs": [["GBP", "USD"], ["EUR", "GBP"]]}"#,
            10,
        );

        let second = scheduler.tick().await;
        assert_eq!(
            triples(&second),
            vec![
                ("GBP".to_string(), "USD".to_string(), Some(1.2701)),
                ("EUR".to_string(), "GBP".to_string(), Some(0.8561)),
            ]
        );
        assert_eq!(scheduler.watcher().current().interval_seconds, 30);
        assert_eq!(scheduler.metrics().snapshot().reloads_applied, 1);
        assert_eq!(transport.calls().len(), 3);
    }

    #[tokio::test]
    async fn test_invalid_reload_keeps_serving_previous_pairs() {
        let dir = tempfile::tempdir().unwrap();
        let transport = Arc::new(MockTransport::new());
        transport.set_rate_text(pair("EUR", "GBP"), "0.8561");
        let writer = Arc::new(MemoryWriter::default());

        let scheduler = scheduler_for(
            &dir,
            r#"{"interval_seconds": 60, "currency_pairs": [["EUR", "GBP"]]}"#,
            transport,
            writer,
        )
        .await;

        write_config(
            scheduler.watcher().path(),
            r#"{"interval_seconds": "soon", "currency_pairs": []}"#,
            10,
        );

        let set = scheduler.tick().await;
        assert_eq!(
            triples(&set),
            vec![("EUR".to_string(), "GBP".to_string(), Some(0.8561))]
        );
        assert_eq!(scheduler.metrics().snapshot().reloads_rejected, 1);
    }

    #[tokio::test]
    async fn test_write_failure_is_not_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let transport = Arc::new(MockTransport::new());
        transport.set_rate_text(pair("EUR", "GBP"), "0.8561");

        let scheduler = scheduler_for(
            &dir,
            r#"{"interval_seconds": 60, "currency_pairs": [["EUR", "GBP"]]}"#,
            transport,
            Arc::new(MemoryWriter::failing()),
        )
        .await;

        let set = scheduler.tick().await;
        assert_eq!(set.results.len(), 1);

        let snapshot = scheduler.metrics().snapshot();
        assert_eq!(snapshot.write_failures, 1);
        assert_eq!(snapshot.ticks_total, 1);
    }

    #[tokio::test]
    async fn test_run_until_stopped() {
        let dir = tempfile::tempdir().unwrap();
        let transport = Arc::new(MockTransport::new());
        transport.set_rate_text(pair("EUR", "GBP"), "0.8561");
        let writer = Arc::new(MemoryWriter::default());

        let scheduler = Arc::new(
            scheduler_for(
                &dir,
                r#"{"interval_seconds": 1, "currency_pairs": [["EUR", "GBP"]]}"#,
                transport,
                writer.clone(),
            )
            .await,
        );
        assert_eq!(scheduler.state(), SchedulerState::Starting);

        let runner = scheduler.clone();
        let handle = tokio::spawn(async move { runner.run().await });

        tokio::time::timeout(Duration::from_secs(5), async {
            while writer.count() == 0 {
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await
        .unwrap();
        assert_eq!(scheduler.state(), SchedulerState::Running);

        scheduler.stop();
        let result = tokio::time::timeout(Duration::from_secs(5), handle)
            .await
            .unwrap()
            .unwrap();

        assert!(result.is_ok());
        assert_eq!(scheduler.state(), SchedulerState::Stopped);
        assert!(scheduler.metrics().snapshot().ticks_total >= 1);

        assert!(matches!(
            scheduler.run().await,
            Err(PollerError::AlreadyRunning)
        ));
    }

    #[tokio::test]
    async fn test_stop_before_run() {
        let dir = tempfile::tempdir().unwrap();
        let writer = Arc::new(MemoryWriter::default());
        let scheduler = scheduler_for(
            &dir,
            r#"{"interval_seconds": 60, "currency_pairs": []}"#,
            Arc::new(MockTransport::new()),
            writer.clone(),
        )
        .await;

        scheduler.stop();
        scheduler.run().await.unwrap();

        assert_eq!(scheduler.state(), SchedulerState::Stopped);
        assert_eq!(writer.count(), 0);
    }
}
