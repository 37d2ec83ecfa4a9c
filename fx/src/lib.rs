//! RatePoll FX Fetching
//!
//! Fetches exchange rates for a list of currency pairs from a single web
//! source.
//!
//! # Features
//!
//! - Shared HTTP transport with bounded retry and exponential backoff
//! - Markup rate extraction behind a pluggable trait
//! - Bounded worker pool that always returns one result per requested pair
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use ratepoll_fx::{FetchWorkerPool, HttpTransport, MarkupRateExtractor, TransportConfig};
//! use ratepoll_common::CurrencyPair;
//!
//! let transport = Arc::new(HttpTransport::new(TransportConfig::default())?);
//! let pool = FetchWorkerPool::new(transport, Arc::new(MarkupRateExtractor::standard()?), 5);
//!
//! let pairs = vec![CurrencyPair::parse("EUR", "GBP")?];
//! let results = pool.run(&pairs).await;
//! ```

pub mod error;
pub mod extractor;
pub mod pool;
pub mod retry;
pub mod transport;

pub use error::{ExtractionError, FetchError, FetchErrorKind, FetchResult};
pub use extractor::{MarkupRateExtractor, RateExtractor, DEFAULT_RATE_CLASS};
pub use pool::{FetchWorkerPool, DEFAULT_MAX_WORKERS};
pub use retry::RetryPolicy;
pub use transport::{HttpTransport, Transport, TransportConfig};

#[cfg(any(test, feature = "test-utils"))]
pub use transport::MockTransport;
