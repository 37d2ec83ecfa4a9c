//! Transport retry policy.

use std::time::Duration;

use ratepoll_common::constants;

use crate::error::FetchError;

/// Bounded automatic retry for transient failures.
///
/// The delay before retry `n` (0-based) is `backoff_base * 2^n`, capped at
/// `max_backoff`.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Retries after the first attempt.
    pub max_retries: u32,
    /// HTTP statuses treated as transient.
    pub retry_statuses: Vec<u16>,
    /// Delay before the first retry.
    pub backoff_base: Duration,
    /// Upper bound on any single delay.
    pub max_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            retry_statuses: vec![500, 502, 503, 504],
            backoff_base: constants::default_backoff_base(),
            max_backoff: constants::max_backoff(),
        }
    }
}

impl RetryPolicy {
    /// A policy that never retries.
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            ..Self::default()
        }
    }

    /// Check whether a status should be retried.
    pub fn is_retryable_status(&self, status: u16) -> bool {
        self.retry_statuses.contains(&status)
    }

    /// Check whether an error should be retried.
    pub fn is_retryable(&self, error: &FetchError) -> bool {
        match error {
            FetchError::Network(_) => true,
            FetchError::Http { status, .. } => self.is_retryable_status(*status),
            FetchError::Extraction(_) => false,
        }
    }

    /// Delay before retry number `retry` (0-based).
    pub fn backoff(&self, retry: u32) -> Duration {
        let factor = 2u32.checked_pow(retry).unwrap_or(u32::MAX);
        self.backoff_base
            .checked_mul(factor)
            .unwrap_or(self.max_backoff)
            .min(self.max_backoff)
    }
}
