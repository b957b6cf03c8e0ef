use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::timeframe::Timeframe;

/// One OHLCV bar for a fixed interval of one instrument.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
    pub timestamp: DateTime<Utc>,
}

impl Candle {
    pub fn new(
        open: f64,
        high: f64,
        low: f64,
        close: f64,
        volume: f64,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            open,
            high,
            low,
            close,
            volume,
            timestamp,
        }
    }

    /// Absolute distance between open and close.
    pub fn body(&self) -> f64 {
        (self.close - self.open).abs()
    }

    /// Distance from the top of the body to the high.
    pub fn upper_wick(&self) -> f64 {
        (self.high - self.open.max(self.close)).max(0.0)
    }

    pub fn is_bearish(&self) -> bool {
        self.close < self.open
    }
}

/// Candles for one symbol on one timeframe, oldest first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandleSeries {
    pub symbol: String,
    pub timeframe: Timeframe,
    pub candles: Vec<Candle>,
}

impl CandleSeries {
    pub fn new(symbol: impl Into<String>, timeframe: Timeframe, candles: Vec<Candle>) -> Self {
        Self {
            symbol: symbol.into(),
            timeframe,
            candles,
        }
    }

    /// Timestamps strictly increase from one candle to the next.
    pub fn is_strictly_ordered(&self) -> bool {
        self.candles
            .windows(2)
            .all(|pair| pair[0].timestamp < pair[1].timestamp)
    }
}

/// The trailing `len` candles of a slice, or `None` when it is shorter.
pub fn tail(candles: &[Candle], len: usize) -> Option<&[Candle]> {
    if len == 0 || candles.len() < len {
        return None;
    }
    Some(&candles[candles.len() - len..])
}
