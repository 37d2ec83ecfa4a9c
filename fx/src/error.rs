//! Fetch error types.

use thiserror::Error;

/// Errors produced while fetching a single pair.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum FetchError {
    /// Connection, timeout or body read failure.
    #[error("Network error: {0}")]
    Network(String),

    /// Non-retryable status, or retryable status after retries ran out.
    #[error("HTTP status {status} after {attempts} attempt(s)")]
    Http { status: u16, attempts: u32 },

    /// Response did not contain a recognisable rate.
    #[error("Rate extraction failed: {0}")]
    Extraction(#[from] ExtractionError),
}

/// Coarse classification of a [`FetchError`], used in logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchErrorKind {
    NetworkError,
    HttpError,
    ExtractionError,
}

impl FetchError {
    /// Get the error kind.
    pub fn kind(&self) -> FetchErrorKind {
        match self {
            FetchError::Network(_) => FetchErrorKind::NetworkError,
            FetchError::Http { .. } => FetchErrorKind::HttpError,
            FetchError::Extraction(_) => FetchErrorKind::ExtractionError,
        }
    }
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        FetchError::Network(err.to_string())
    }
}

/// Reasons a response body yields no rate.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ExtractionError {
    /// The element carrying the rate is missing.
    #[error("Rate section with class {class:?} not found")]
    SectionNotFound { class: String },

    /// The element exists but holds no decimal number.
    #[error("No numeric rate in {0:?}")]
    NoNumericRate(String),
}

/// Result type for fetch operations.
pub type FetchResult<T> = Result<T, FetchError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kinds() {
        assert_eq!(
            FetchError::Network("reset".into()).kind(),
            FetchErrorKind::NetworkError
        );
        assert_eq!(
            FetchError::Http { status: 503, attempts: 4 }.kind(),
            FetchErrorKind::HttpError
        );
        assert_eq!(
            FetchError::from(ExtractionError::NoNumericRate("Invalid rate".into())).kind(),
            FetchErrorKind::ExtractionError
        );
    }

    #[test]
    fn test_http_error_message() {
        let err = FetchError::Http { status: 503, attempts: 4 };
        assert_eq!(err.to_string(), "HTTP status 503 after 4 attempt(s)");
    }
}
