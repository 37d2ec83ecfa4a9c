//! Time utilities and timing defaults.

use chrono::{DateTime, Utc};

/// Operator-tunable timing defaults.
pub mod constants {
    use std::time::Duration;

    /// Per-request timeout for upstream fetches (10 seconds).
    pub fn default_request_timeout() -> Duration {
        Duration::from_secs(10)
    }

    /// Base delay before the first retry (100 milliseconds).
    pub fn default_backoff_base() -> Duration {
        Duration::from_millis(100)
    }

    /// Upper bound on a single retry delay (120 seconds).
    pub fn max_backoff() -> Duration {
        Duration::from_secs(120)
    }
}

/// A timestamp (always UTC).
pub type Timestamp = DateTime<Utc>;

/// Get the current timestamp.
pub fn now() -> Timestamp {
    Utc::now()
}
