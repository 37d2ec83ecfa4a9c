//! HTTP transport for the upstream rate source.

use std::time::Duration;

use async_trait::async_trait;
use ratepoll_common::{constants, CurrencyPair};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT};
use tracing::{debug, warn};

use crate::error::{FetchError, FetchResult};
use crate::retry::RetryPolicy;

/// Browser-like agent string; the upstream source rejects bare clients.
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
AppleWebKit/537.36 (KHTML, like Gecko) Chrome/87.0.4280.88 Safari/537.36";

/// Trait for fetching the raw page for a currency pair.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Fetch the response body for a pair.
    async fn fetch(&self, pair: &CurrencyPair) -> FetchResult<Vec<u8>>;
}

/// Configuration for the HTTP transport.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    /// Converter endpoint; pair codes and amount go in the query string.
    pub base_url: String,
    /// Amount parameter sent with every request.
    pub amount: u32,
    /// `User-Agent` header sent with every request.
    pub user_agent: String,
    /// Per-request timeout.
    pub request_timeout: Duration,
    /// Retry policy for transient failures.
    pub retry: RetryPolicy,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            base_url: "https://www.xe.com/currencyconverter/convert/".to_string(),
            amount: 1,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            request_timeout: constants::default_request_timeout(),
            retry: RetryPolicy::default(),
        }
    }
}

/// Transport backed by one shared `reqwest` client (one connection pool).
pub struct HttpTransport {
    client: reqwest::Client,
    config: TransportConfig,
}

impl HttpTransport {
    /// Create a new transport.
    pub fn new(config: TransportConfig) -> Result<Self, reqwest::Error> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("text/html"));

        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.as_str())
            .default_headers(headers)
            .timeout(config.request_timeout)
            .build()?;

        Ok(Self { client, config })
    }

    async fn send_once(&self, pair: &CurrencyPair, attempt: u32) -> FetchResult<Vec<u8>> {
        let amount = self.config.amount.to_string();
        let response = self
            .client
            .get(&self.config.base_url)
            .query(&[
                ("Amount", amount.as_str()),
                ("From", pair.from.code()),
                ("To", pair.to.code()),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Http {
                status: status.as_u16(),
                attempts: attempt,
            });
        }

        let body = response.bytes().await?;
        Ok(body.to_vec())
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn fetch(&self, pair: &CurrencyPair) -> FetchResult<Vec<u8>> {
        let policy = &self.config.retry;
        let mut retry = 0;

        loop {
            let attempt = retry + 1;
            match self.send_once(pair, attempt).await {
                Ok(body) => {
                    debug!(pair = %pair, attempt, bytes = body.len(), "Fetched rate page");
                    return Ok(body);
                }
                Err(e) if retry < policy.max_retries && policy.is_retryable(&e) => {
                    let delay = policy.backoff(retry);
                    warn!(
                        pair = %pair,
                        attempt,
                        error = %e,
                        delay_ms = delay.as_millis() as u64,
                        "Transient fetch failure, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    retry += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

/// Mock transport for testing.
#[cfg(any(test, feature = "test-utils"))]
pub struct MockTransport {
    responses: parking_lot::Mutex<std::collections::HashMap<CurrencyPair, FetchResult<Vec<u8>>>>,
    calls: parking_lot::Mutex<Vec<CurrencyPair>>,
    delay: Option<Duration>,
    in_flight: std::sync::atomic::AtomicUsize,
    max_in_flight: std::sync::atomic::AtomicUsize,
}

#[cfg(any(test, feature = "test-utils"))]
impl MockTransport {
    /// Create a mock with no configured responses.
    pub fn new() -> Self {
        Self {
            responses: parking_lot::Mutex::new(std::collections::HashMap::new()),
            calls: parking_lot::Mutex::new(Vec::new()),
            delay: None,
            in_flight: std::sync::atomic::AtomicUsize::new(0),
            max_in_flight: std::sync::atomic::AtomicUsize::new(0),
        }
    }

    /// Hold every fetch for `delay` before answering.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Answer `pair` with `body`.
    pub fn set_body(&self, pair: CurrencyPair, body: impl Into<Vec<u8>>) {
        self.responses.lock().insert(pair, Ok(body.into()));
    }

    /// Answer `pair` with a page whose rate section holds `text`.
    pub fn set_rate_text(&self, pair: CurrencyPair, text: &str) {
        let body = format!(
            r#"<html><body><p class="{}">{}</p></body></html>"#,
            crate::extractor::DEFAULT_RATE_CLASS,
            text
        );
        self.set_body(pair, body);
    }

    /// Answer `pair` with an error.
    pub fn set_error(&self, pair: CurrencyPair, error: FetchError) {
        self.responses.lock().insert(pair, Err(error));
    }

    /// Pairs fetched so far, in call order.
    pub fn calls(&self) -> Vec<CurrencyPair> {
        self.calls.lock().clone()
    }

    /// Highest number of fetches observed running at once.
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(std::sync::atomic::Ordering::SeqCst)
    }
}

#[cfg(any(test, feature = "test-utils"))]
impl Default for MockTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(any(test, feature = "test-utils"))]
#[async_trait]
impl Transport for MockTransport {
    async fn fetch(&self, pair: &CurrencyPair) -> FetchResult<Vec<u8>> {
        use std::sync::atomic::Ordering;

        self.calls.lock().push(pair.clone());
        let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(current, Ordering::SeqCst);

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let response = self
            .responses
            .lock()
            .get(pair)
            .cloned()
            .unwrap_or_else(|| Err(FetchError::Network(format!("no response for {}", pair))));

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        response
    }
}
