//! RatePoll Binary
//!
//! Polls exchange rates for the pairs in a watched configuration file and
//! writes them to a JSON file on every tick.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing::{debug, error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use ratepoll_fx::{FetchWorkerPool, HttpTransport, MarkupRateExtractor};
use ratepoll_poller::{ConfigWatcher, JsonFileWriter, PollScheduler, PollerConfig};

/// RatePoll CLI
#[derive(Parser, Debug)]
#[command(name = "ratepoll")]
#[command(about = "Periodically fetch FX rates and write them as JSON")]
struct Args {
    /// Polling configuration file (interval and currency pairs)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Output file, overwritten every tick
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Maximum concurrent fetches
    #[arg(long)]
    max_workers: Option<usize>,

    /// Run a single tick and exit
    #[arg(long)]
    once: bool,

    /// Emit JSON log lines
    #[arg(long)]
    log_json: bool,

    /// Log level when RUST_LOG is unset
    #[arg(long)]
    log_level: Option<String>,
}

impl Args {
    fn apply(&self, config: &mut PollerConfig) {
        if let Some(path) = &self.config {
            config.config_path = path.clone();
        }
        if let Some(path) = &self.output {
            config.output_path = path.clone();
        }
        if let Some(workers) = self.max_workers {
            config.max_workers = workers;
        }
        if let Some(level) = &self.log_level {
            config.log_level = level.clone();
        }
        config.log_json |= self.log_json;
    }
}

fn init_tracing(config: &PollerConfig) {
    let filter = tracing_subscriber::EnvFilter::new(
        std::env::var("RUST_LOG").unwrap_or_else(|_| config.log_level.clone()),
    );

    tracing_subscriber::registry()
        .with(filter)
        .with(config.log_json.then(|| tracing_subscriber::fmt::layer().json()))
        .with((!config.log_json).then(|| tracing_subscriber::fmt::layer()))
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let mut config = PollerConfig::from_env();
    args.apply(&mut config);

    init_tracing(&config);

    info!("Starting RatePoll");

    if let Err(e) = config.validate() {
        error!(error = %e, "Invalid configuration");
        return Err(anyhow::anyhow!("Configuration error: {}", e));
    }

    let transport =
        HttpTransport::new(config.transport.clone()).context("Failed to build HTTP client")?;
    let extractor = MarkupRateExtractor::standard().context("Failed to build rate extractor")?;
    let pool = FetchWorkerPool::new(Arc::new(transport), Arc::new(extractor), config.max_workers);

    // A missing or invalid polling file at startup is fatal.
    let watcher = ConfigWatcher::load(&config.config_path)
        .await
        .with_context(|| {
            format!(
                "Cannot load polling configuration from {}",
                config.config_path.display()
            )
        })?;

    let writer = Arc::new(JsonFileWriter::new(&config.output_path));
    let scheduler = Arc::new(PollScheduler::new(watcher, pool, writer));

    info!(
        config = %config.config_path.display(),
        output = %config.output_path.display(),
        max_workers = config.max_workers,
        source = %config.transport.base_url,
        "RatePoll running"
    );

    if args.once {
        let set = scheduler.tick().await;
        if scheduler.metrics().snapshot().write_failures > 0 {
            return Err(anyhow::anyhow!(
                "Failed to write results to {}",
                config.output_path.display()
            ));
        }
        info!(
            pairs = set.results.len(),
            failed = set.failure_count(),
            "Single tick complete"
        );
        return Ok(());
    }

    // Set up graceful shutdown
    let scheduler_clone = scheduler.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("Shutdown signal received");
                scheduler_clone.stop();
            }
            Err(e) => error!(error = %e, "Failed to listen for Ctrl+C"),
        }
    });

    scheduler.run().await?;

    debug!(metrics = %scheduler.metrics().to_prometheus(), "Final counters");
    info!("RatePoll shutdown complete");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_override_settings() {
        let args = Args::parse_from([
            "ratepoll",
            "--config",
            "pairs.json",
            "--output",
            "out/rates.json",
            "--max-workers",
            "2",
            "--log-json",
        ]);

        let mut config = PollerConfig::default();
        args.apply(&mut config);

        assert_eq!(config.config_path, PathBuf::from("pairs.json"));
        assert_eq!(config.output_path, PathBuf::from("out/rates.json"));
        assert_eq!(config.max_workers, 2);
        assert!(config.log_json);
        assert!(!args.once);
    }

    #[test]
    fn test_no_flags_keep_settings() {
        let args = Args::parse_from(["ratepoll", "--once"]);
        let mut config = PollerConfig::default();
        args.apply(&mut config);

        assert_eq!(config.config_path, PathBuf::from("config.json"));
        assert_eq!(config.max_workers, 5);
        assert!(args.once);
    }
}
