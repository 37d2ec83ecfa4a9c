//! RatePoll Common Types
//!
//! Shared types used across the ratepoll workspace: currency codes and
//! pairs, per-pair fetch results, and the result set written on every tick.

pub mod currency;
pub mod rate;
pub mod error;
pub mod time;

pub use currency::*;
pub use rate::*;
pub use error::*;
pub use time::*;
