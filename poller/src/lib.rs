//! RatePoll Poller
//!
//! The poller periodically fetches exchange rates for the configured
//! currency pairs and writes them as timestamped JSON. The pair list and
//! interval are reloaded from disk without restarting.

pub mod config;
pub mod error;
pub mod fetch_config;
pub mod metrics;
pub mod scheduler;
pub mod state;
pub mod watcher;
pub mod writer;

pub use config::PollerConfig;
pub use error::{ConfigError, ConfigErrorKind, PollerError, Result};
pub use fetch_config::FetchConfig;
pub use metrics::{MetricsSnapshot, PollMetrics, SharedMetrics};
pub use scheduler::PollScheduler;
pub use state::SchedulerState;
pub use watcher::{load_fetch_config, ConfigWatcher, ReloadOutcome};
pub use writer::{read_result_set, JsonFileWriter, ResultWriter};
