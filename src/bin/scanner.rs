//! Perpscan batch scanner
//!
//! Runs one pass over every USDT-margined perpetual, delivers the confirmed
//! setups to the configured sinks, then exits.

use dotenvy::dotenv;
use perpscan::config::{get_environment, ScannerConfig};
use perpscan::core::{LogProgress, Scanner};
use perpscan::logging;
use perpscan::notify::Notifier;
use perpscan::services::BinanceFuturesClient;
use std::sync::Arc;
use tokio::signal;
use tokio::sync::watch;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load environment variables from .env if present
    dotenv().ok();

    logging::init_logging();

    let config = ScannerConfig::from_env()?;
    config.validate()?;

    info!(
        environment = %get_environment(),
        variant = config.pipeline.name(),
        concurrency = config.concurrency,
        risk_reward = config.risk.risk_reward_ratio,
        "Starting Perpscan"
    );

    let client = Arc::new(BinanceFuturesClient::from_config(&config.exchange)?);
    let scanner = Scanner::from_config(client.clone(), &config)?.with_progress(Arc::new(LogProgress));
    let notifier = Notifier::from_config(&config.notify);

    let (cancel_tx, cancel_rx) = watch::channel(false);
    tokio::spawn(async move {
        if signal::ctrl_c().await.is_ok() {
            warn!("Interrupt received, finishing in-flight symbols...");
            let _ = cancel_tx.send(true);
        }
    });

    let report = scanner.run(client.as_ref(), &notifier, cancel_rx).await?;

    info!(
        signals = report.signals.len(),
        cancelled = report.cancelled,
        elapsed_s = report.elapsed.as_secs_f64(),
        "Done: {}",
        report.statistics
    );

    Ok(())
}
