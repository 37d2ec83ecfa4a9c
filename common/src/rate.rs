//! Per-pair fetch results and the result set written on every tick.

use serde::{Deserialize, Serialize};

use crate::currency::{Currency, CurrencyPair};
use crate::time::Timestamp;

/// Outcome of fetching one currency pair.
///
/// A failed fetch is still present with `rate: None`, so a pair list and its
/// results always line up one to one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RateResult {
    /// Currency converted from.
    pub from: Currency,
    /// Currency converted to.
    pub to: Currency,
    /// Conversion factor, or `None` when the fetch failed.
    pub rate: Option<f64>,
}

impl RateResult {
    /// Create a result for a pair.
    pub fn new(pair: CurrencyPair, rate: Option<f64>) -> Self {
        Self {
            from: pair.from,
            to: pair.to,
            rate,
        }
    }

    /// Create a successful result.
    pub fn success(pair: CurrencyPair, rate: f64) -> Self {
        Self::new(pair, Some(rate))
    }

    /// Create a failed result.
    pub fn failed(pair: CurrencyPair) -> Self {
        Self::new(pair, None)
    }

    /// Check whether a rate was obtained.
    pub fn is_success(&self) -> bool {
        self.rate.is_some()
    }

    /// Get the pair this result belongs to.
    pub fn pair(&self) -> CurrencyPair {
        CurrencyPair::new(self.from.clone(), self.to.clone())
    }
}

/// All results produced by one tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultSet {
    /// When the tick's results were packaged.
    pub timestamp: Timestamp,
    /// One entry per requested pair, in request order.
    #[serde(rename = "exchange_rates")]
    pub results: Vec<RateResult>,
}

impl ResultSet {
    /// Create a new result set.
    pub fn new(timestamp: Timestamp, results: Vec<RateResult>) -> Self {
        Self { timestamp, results }
    }

    /// Number of pairs with a rate.
    pub fn success_count(&self) -> usize {
        self.results.iter().filter(|r| r.is_success()).count()
    }

    /// Number of pairs whose fetch failed.
    pub fn failure_count(&self) -> usize {
        self.results.len() - self.success_count()
    }
}
