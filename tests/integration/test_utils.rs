#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use perpscan::models::{Candle, Direction, Signal, Timeframe};
use perpscan::notify::{NotifyError, ResultSink};
use perpscan::risk::RiskPolicy;
use perpscan::services::market_data::{CandleFetcher, InstrumentUniverse, MarketDataError};
use perpscan::signals::{PipelineConfig, SignalPipeline};

use crate::candles::{at, breakout_slow, flat_series, retest_fast};

/// What the fake exchange does for one symbol.
#[derive(Clone)]
pub enum Script {
    Candles { slow: Vec<Candle>, fast: Vec<Candle> },
    Fail,
    Panic,
}

impl Script {
    pub fn confirmed() -> Self {
        Script::Candles {
            slow: breakout_slow(),
            fast: retest_fast(),
        }
    }

    pub fn rejected() -> Self {
        Script::Candles {
            slow: flat_series(60),
            fast: retest_fast(),
        }
    }
}

/// In-memory candle source that records every call and the peak number of
/// fetches in flight at once.
#[derive(Default)]
pub struct FakeFetcher {
    scripts: HashMap<String, Script>,
    delay: Duration,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    calls: Mutex<Vec<(String, Timeframe)>>,
}

impl FakeFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, symbol: &str, script: Script) -> Self {
        self.scripts.insert(symbol.to_string(), script);
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    pub fn calls(&self) -> Vec<(String, Timeframe)> {
        self.calls.lock().unwrap().clone()
    }

    pub fn calls_for(&self, symbol: &str) -> Vec<Timeframe> {
        self.calls()
            .into_iter()
            .filter(|(s, _)| s == symbol)
            .map(|(_, tf)| tf)
            .collect()
    }
}

#[async_trait]
impl CandleFetcher for FakeFetcher {
    async fn fetch(
        &self,
        symbol: &str,
        timeframe: Timeframe,
        _limit: usize,
    ) -> Result<Vec<Candle>, MarketDataError> {
        self.calls
            .lock()
            .unwrap()
            .push((symbol.to_string(), timeframe));

        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        match self.scripts.get(symbol) {
            Some(Script::Candles { slow, fast }) => Ok(if timeframe == Timeframe::H4 {
                slow.clone()
            } else {
                fast.clone()
            }),
            Some(Script::Fail) => Err(MarketDataError::Api {
                status: 503,
                body: "unavailable".to_string(),
            }),
            Some(Script::Panic) => panic!("fetcher blew up for {symbol}"),
            None => Err(MarketDataError::Unavailable(format!("unknown symbol {symbol}"))),
        }
    }
}

pub struct FailingUniverse;

#[async_trait]
impl InstrumentUniverse for FailingUniverse {
    async fn list(&self) -> Result<Vec<String>, MarketDataError> {
        Err(MarketDataError::Unavailable("exchange info down".to_string()))
    }
}

/// Keeps every batch it is handed.
#[derive(Default)]
pub struct RecordingSink {
    batches: Mutex<Vec<Vec<Signal>>>,
}

impl RecordingSink {
    pub fn batches(&self) -> Vec<Vec<Signal>> {
        self.batches.lock().unwrap().clone()
    }
}

#[async_trait]
impl ResultSink for RecordingSink {
    fn name(&self) -> &'static str {
        "recording"
    }

    async fn on_signals(&self, signals: &[Signal]) -> Result<(), NotifyError> {
        self.batches.lock().unwrap().push(signals.to_vec());
        Ok(())
    }
}

pub fn breakout_pipeline() -> SignalPipeline {
    SignalPipeline::new(PipelineConfig::default(), RiskPolicy::default()).unwrap()
}

pub fn symbols(names: &[&str]) -> Vec<String> {
    names.iter().map(|s| s.to_string()).collect()
}

pub fn sample_signal(symbol: &str) -> Signal {
    Signal {
        symbol: symbol.to_string(),
        direction: Direction::Long,
        variant: "breakout".to_string(),
        reference_level: 101.0,
        entry_price: 101.9,
        stop_loss: 98.98,
        take_profit: 109.2,
        risk_reward_ratio: 2.5,
        trailing_stop: None,
        as_of: at(0, 15),
    }
}
