//! Bounded fan-out of the signal pipeline over an instrument universe.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::{mpsc, oneshot, watch, Mutex};
use tracing::{debug, error, info, warn};

use crate::config::{ConfigError, ScannerConfig};
use crate::models::Signal;
use crate::notify::ResultSink;
use crate::services::market_data::{CandleFetcher, InstrumentUniverse, MarketDataError};
use crate::signals::{Outcome, SignalPipeline};

use super::progress::{NoopProgress, ProgressSink, ScanProgress};
use super::stats::ScanStatistics;

pub const DEFAULT_CONCURRENCY: usize = 10;
pub const DEFAULT_PROGRESS_INTERVAL: Duration = Duration::from_millis(100);

#[derive(Debug, thiserror::Error)]
pub enum ScanError {
    #[error("failed to load instrument universe: {0}")]
    Universe(#[source] MarketDataError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Everything one scan produced.
#[derive(Debug, Clone)]
pub struct ScanReport {
    /// Confirmed signals, sorted by symbol.
    pub signals: Vec<Signal>,
    pub statistics: ScanStatistics,
    /// Instruments handed to the scan.
    pub total: usize,
    pub elapsed: Duration,
    /// Set when cancellation stopped the scan before every instrument finished.
    pub cancelled: bool,
}

/// Runs the pipeline for every instrument on a fixed pool of workers pulling
/// from one shared queue.
pub struct Scanner {
    fetcher: Arc<dyn CandleFetcher>,
    pipeline: Arc<SignalPipeline>,
    progress: Arc<dyn ProgressSink>,
    progress_interval: Duration,
    concurrency: usize,
}

impl Scanner {
    pub fn new(fetcher: Arc<dyn CandleFetcher>, pipeline: SignalPipeline) -> Self {
        Self {
            fetcher,
            pipeline: Arc::new(pipeline),
            progress: Arc::new(NoopProgress),
            progress_interval: DEFAULT_PROGRESS_INTERVAL,
            concurrency: DEFAULT_CONCURRENCY,
        }
    }

    /// Build from a full configuration, validating it first.
    pub fn from_config(
        fetcher: Arc<dyn CandleFetcher>,
        config: &ScannerConfig,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        let pipeline = SignalPipeline::new(config.pipeline.clone(), config.risk)?;
        Ok(Self::new(fetcher, pipeline)
            .with_concurrency(config.concurrency)
            .with_progress_interval(config.progress_interval))
    }

    pub fn with_progress(mut self, sink: Arc<dyn ProgressSink>) -> Self {
        self.progress = sink;
        self
    }

    pub fn with_progress_interval(mut self, interval: Duration) -> Self {
        self.progress_interval = interval.max(Duration::from_millis(1));
        self
    }

    /// Pool size used by [`Scanner::run`].
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency;
        self
    }

    pub fn pipeline(&self) -> &SignalPipeline {
        &self.pipeline
    }

    /// One full batch pass: resolve the universe, scan it, hand the signals to
    /// `sink`. Only a universe failure is fatal.
    pub async fn run(
        &self,
        universe: &dyn InstrumentUniverse,
        sink: &dyn ResultSink,
        cancel: watch::Receiver<bool>,
    ) -> Result<ScanReport, ScanError> {
        let symbols = universe.list().await.map_err(ScanError::Universe)?;
        info!(count = symbols.len(), "Loaded {} tradable symbols", symbols.len());

        let report = self.scan_until(symbols, self.concurrency, cancel).await;

        if let Err(e) = sink.on_signals(&report.signals).await {
            error!(error = %e, "Failed to deliver scan results");
        }
        Ok(report)
    }

    pub async fn scan(&self, symbols: Vec<String>, concurrency: usize) -> ScanReport {
        let (_cancel_tx, cancel_rx) = watch::channel(false);
        self.scan_until(symbols, concurrency, cancel_rx).await
    }

    /// Scan `symbols` on `concurrency` workers (clamped to `[1, symbols.len()]`).
    ///
    /// Once `cancel` reads `true`, workers finish the symbol in hand and stop
    /// pulling; the report then covers only the finished symbols.
    pub async fn scan_until(
        &self,
        symbols: Vec<String>,
        concurrency: usize,
        cancel: watch::Receiver<bool>,
    ) -> ScanReport {
        let started = Instant::now();
        let total = symbols.len();
        let workers = concurrency.clamp(1, total.max(1));

        info!(
            total = total,
            workers = workers,
            variant = self.pipeline.config().name(),
            "Scanning {} symbols with {} workers",
            total,
            workers
        );

        let queue = Arc::new(Mutex::new(VecDeque::from(symbols)));
        let (outcome_tx, mut outcome_rx) = mpsc::unbounded_channel::<(String, Outcome)>();

        let mut handles = Vec::with_capacity(workers);
        for worker_id in 0..workers {
            let queue = queue.clone();
            let outcome_tx = outcome_tx.clone();
            let pipeline = self.pipeline.clone();
            let fetcher = self.fetcher.clone();
            let cancel = cancel.clone();

            handles.push(tokio::spawn(async move {
                loop {
                    if *cancel.borrow() {
                        debug!(worker = worker_id, "Worker stopping on cancellation");
                        break;
                    }
                    let Some(symbol) = queue.lock().await.pop_front() else {
                        break;
                    };
                    let outcome = evaluate_isolated(&pipeline, &fetcher, &symbol).await;
                    if outcome_tx.send((symbol, outcome)).is_err() {
                        break;
                    }
                }
            }));
        }
        drop(outcome_tx);

        let done = Arc::new(AtomicUsize::new(0));
        let (stop_tx, ticker) = self.spawn_ticker(done.clone(), total, started);

        let mut statistics = ScanStatistics::new();
        let mut signals = Vec::new();
        while let Some((symbol, outcome)) = outcome_rx.recv().await {
            statistics.record(&outcome);
            match outcome {
                Outcome::Confirmed(signal) => {
                    info!(
                        symbol = %symbol,
                        direction = %signal.direction,
                        entry = signal.entry_price,
                        stop_loss = signal.stop_loss,
                        take_profit = signal.take_profit,
                        "Signal confirmed for {}",
                        symbol
                    );
                    signals.push(signal);
                }
                Outcome::Rejected(stage) => {
                    debug!(symbol = %symbol, stage = %stage, "Rejected at {}", stage);
                }
                Outcome::Failed { reason } => {
                    warn!(symbol = %symbol, error = %reason, "Evaluation failed for {}", symbol);
                }
            }
            done.fetch_add(1, Ordering::Release);
        }

        for handle in handles {
            if let Err(e) = handle.await {
                error!(error = %e, "Scan worker terminated abnormally");
            }
        }

        let _ = stop_tx.send(());
        let _ = ticker.await;

        let completed = statistics.total();
        self.progress.on_progress(ScanProgress {
            done: completed,
            total,
            elapsed: started.elapsed(),
        });

        signals.sort_by(|a, b| a.symbol.cmp(&b.symbol));

        let report = ScanReport {
            signals,
            statistics,
            total,
            elapsed: started.elapsed(),
            cancelled: completed < total,
        };

        info!(
            total = total,
            completed = completed,
            confirmed = report.statistics.confirmed(),
            errors = report.statistics.errors(),
            cancelled = report.cancelled,
            elapsed_ms = report.elapsed.as_millis() as u64,
            "Scan finished: {}",
            report.statistics
        );

        report
    }

    /// Emits progress at most once per interval until told to stop.
    fn spawn_ticker(
        &self,
        done: Arc<AtomicUsize>,
        total: usize,
        started: Instant,
    ) -> (oneshot::Sender<()>, tokio::task::JoinHandle<()>) {
        let (stop_tx, mut stop_rx) = oneshot::channel::<()>();
        let sink = self.progress.clone();
        let period = self.progress_interval;

        let handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
            loop {
                tokio::select! {
                    _ = &mut stop_rx => break,
                    _ = interval.tick() => {
                        sink.on_progress(ScanProgress {
                            done: done.load(Ordering::Acquire),
                            total,
                            elapsed: started.elapsed(),
                        });
                    }
                }
            }
        });

        (stop_tx, handle)
    }
}

/// Evaluates one symbol on its own task so a panic there becomes that symbol's
/// error outcome instead of taking the worker down.
async fn evaluate_isolated(
    pipeline: &Arc<SignalPipeline>,
    fetcher: &Arc<dyn CandleFetcher>,
    symbol: &str,
) -> Outcome {
    let pipeline = pipeline.clone();
    let fetcher = fetcher.clone();
    let task_symbol = symbol.to_string();

    match tokio::spawn(async move { pipeline.run(fetcher.as_ref(), &task_symbol).await }).await {
        Ok(outcome) => outcome,
        Err(e) => Outcome::failed(format!("evaluation task failed: {e}")),
    }
}
