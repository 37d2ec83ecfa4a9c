//! Error types for shared ratepoll types.

use thiserror::Error;

/// Errors raised while constructing shared types.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CurrencyError {
    /// The code is not three ASCII letters.
    #[error("Invalid currency code: {0:?}")]
    InvalidCode(String),
}
