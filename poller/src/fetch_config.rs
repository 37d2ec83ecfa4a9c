//! Polling configuration: interval and currency pair list.

use std::time::Duration;

use ratepoll_common::{Currency, CurrencyPair};
use serde_json::Value;

use crate::error::ConfigError;

/// Active polling configuration.
///
/// Never mutated after construction; a reload replaces it wholesale.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchConfig {
    /// Seconds to sleep between ticks (at least 1).
    pub interval_seconds: u64,
    /// Pairs to fetch on every tick, in output order.
    pub currency_pairs: Vec<CurrencyPair>,
}

impl FetchConfig {
    /// Create a configuration from already-validated parts.
    pub fn new(interval_seconds: u64, currency_pairs: Vec<CurrencyPair>) -> Self {
        Self {
            interval_seconds,
            currency_pairs,
        }
    }

    /// Sleep between ticks.
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_seconds)
    }

    /// Parse and validate configuration text.
    pub fn parse(text: &str) -> Result<Self, ConfigError> {
        let raw: Value = serde_json::from_str(text)?;
        Self::validate(&raw)
    }

    /// Validate raw JSON, naming the first invalid field on failure.
    pub fn validate(raw: &Value) -> Result<Self, ConfigError> {
        let object = raw
            .as_object()
            .ok_or_else(|| ConfigError::schema("$", "must be a JSON object"))?;

        let interval_seconds = match object.get("interval_seconds") {
            None => return Err(ConfigError::schema("interval_seconds", "is required")),
            Some(value) => value
                .as_u64()
                .filter(|secs| *secs >= 1)
                .ok_or_else(|| {
                    ConfigError::schema("interval_seconds", "must be a positive integer")
                })?,
        };

        let entries = match object.get("currency_pairs") {
            None => return Err(ConfigError::schema("currency_pairs", "is required")),
            Some(value) => value
                .as_array()
                .ok_or_else(|| ConfigError::schema("currency_pairs", "must be an array"))?,
        };

        let currency_pairs = entries
            .iter()
            .enumerate()
            .map(|(index, entry)| parse_pair(index, entry))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self::new(interval_seconds, currency_pairs))
    }
}

fn parse_pair(index: usize, entry: &Value) -> Result<CurrencyPair, ConfigError> {
    let codes = entry
        .as_array()
        .filter(|codes| codes.len() == 2)
        .ok_or_else(|| {
            ConfigError::schema(
                format!("currency_pairs[{}]", index),
                "must be a 2-element [from, to] array",
            )
        })?;

    let from = parse_code(index, 0, &codes[0])?;
    let to = parse_code(index, 1, &codes[1])?;
    Ok(CurrencyPair::new(from, to))
}

fn parse_code(index: usize, position: usize, value: &Value) -> Result<Currency, ConfigError> {
    let field = || format!("currency_pairs[{}][{}]", index, position);
    let code = value
        .as_str()
        .ok_or_else(|| ConfigError::schema(field(), "must be a string"))?;
    Currency::parse(code).map_err(|e| ConfigError::schema(field(), e.to_string()))
}
