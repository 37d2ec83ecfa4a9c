//! Bounded worker pool fetching one rate per currency pair.

use std::sync::Arc;

use ratepoll_common::{CurrencyPair, RateResult};
use tokio::sync::Semaphore;
use tracing::{debug, error, warn};

use crate::error::FetchResult;
use crate::extractor::RateExtractor;
use crate::transport::Transport;

/// Default number of concurrent fetches.
pub const DEFAULT_MAX_WORKERS: usize = 5;

/// Dispatches one fetch task per pair across a bounded set of workers.
///
/// Every requested pair yields exactly one [`RateResult`], in request order.
/// A failed pair is recorded with `rate: None` and never affects its
/// siblings.
pub struct FetchWorkerPool {
    transport: Arc<dyn Transport>,
    extractor: Arc<dyn RateExtractor>,
    permits: Arc<Semaphore>,
    max_workers: usize,
}

impl FetchWorkerPool {
    /// Create a new pool. A `max_workers` of zero is raised to one.
    pub fn new(
        transport: Arc<dyn Transport>,
        extractor: Arc<dyn RateExtractor>,
        max_workers: usize,
    ) -> Self {
        let max_workers = max_workers.max(1);
        Self {
            transport,
            extractor,
            permits: Arc::new(Semaphore::new(max_workers)),
            max_workers,
        }
    }

    /// Get the concurrency limit.
    pub fn max_workers(&self) -> usize {
        self.max_workers
    }

    /// Fetch every pair and return one result per pair, in input order.
    ///
    /// Returns only after every task has finished.
    pub async fn run(&self, pairs: &[CurrencyPair]) -> Vec<RateResult> {
        let handles: Vec<_> = pairs
            .iter()
            .cloned()
            .map(|pair| {
                let permits = self.permits.clone();
                let transport = self.transport.clone();
                let extractor = self.extractor.clone();

                tokio::spawn(async move {
                    let _permit = permits.acquire_owned().await.ok();
                    fetch_rate(transport.as_ref(), extractor.as_ref(), &pair).await
                })
            })
            .collect();

        let mut results = Vec::with_capacity(pairs.len());
        for (pair, handle) in pairs.iter().zip(handles) {
            let rate = match handle.await {
                Ok(Ok(rate)) => {
                    debug!(pair = %pair, rate, "Rate fetched");
                    Some(rate)
                }
                Ok(Err(e)) => {
                    warn!(pair = %pair, kind = ?e.kind(), error = %e, "Rate fetch failed");
                    None
                }
                Err(e) => {
                    error!(pair = %pair, error = %e, "Rate fetch task aborted");
                    None
                }
            };
            results.push(RateResult::new(pair.clone(), rate));
        }

        results
    }
}

async fn fetch_rate(
    transport: &dyn Transport,
    extractor: &dyn RateExtractor,
    pair: &CurrencyPair,
) -> FetchResult<f64> {
    let body = transport.fetch(pair).await?;
    Ok(extractor.extract(&body)?)
}
