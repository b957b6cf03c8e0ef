//! Candle builders shared by unit and integration tests.
#![allow(dead_code)]

use chrono::{DateTime, Duration, TimeZone, Utc};
use perpscan::models::Candle;

pub fn start() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
}

pub fn at(index: usize, step_minutes: i64) -> DateTime<Utc> {
    start() + Duration::minutes(step_minutes * index as i64)
}

pub fn candle(open: f64, high: f64, low: f64, close: f64, volume: f64, index: usize) -> Candle {
    Candle::new(open, high, low, close, volume, at(index, 240))
}

/// `count` identical 4h bars: open/close 100, range 99..101, volume 100.
pub fn flat_series(count: usize) -> Vec<Candle> {
    (0..count)
        .map(|i| candle(100.0, 101.0, 99.0, 100.0, 100.0, i))
        .collect()
}

/// 60 flat 4h bars followed by a breakout bar through resistance 101 on 4x volume.
pub fn breakout_slow() -> Vec<Candle> {
    let mut candles = flat_series(59);
    candles.push(candle(100.5, 103.0, 100.0, 102.5, 400.0, 59));
    candles
}

/// 15m bars ending in a clean retest of 101.
pub fn retest_fast() -> Vec<Candle> {
    let mut candles: Vec<Candle> = (0..20)
        .map(|i| {
            Candle::new(102.0, 102.4, 101.6, 102.1, 50.0, at(240 * 60 / 15 + i, 15))
        })
        .collect();
    candles.push(Candle::new(101.8, 102.2, 101.0, 101.9, 80.0, at(240 * 60 / 15 + 20, 15)));
    candles
}

/// 15m bars ending in a candle that closes back below 101.
pub fn failed_retest_fast() -> Vec<Candle> {
    let mut candles = retest_fast();
    let last = candles.len() - 1;
    candles[last].low = 100.2;
    candles[last].close = 100.6;
    candles
}

/// Flat 4h bars then a bar that wicks through 101 and closes back at 100.2.
pub fn trap_slow() -> Vec<Candle> {
    let mut candles = flat_series(59);
    candles.push(candle(100.0, 103.0, 99.8, 100.2, 400.0, 59));
    candles
}

/// 15m bars ending bearish.
pub fn bearish_fast() -> Vec<Candle> {
    (0..10)
        .map(|i| {
            let open = 100.5 - i as f64 * 0.05;
            Candle::new(open, open + 0.1, open - 0.3, open - 0.2, 60.0, at(i, 15))
        })
        .collect()
}

pub fn bullish_fast() -> Vec<Candle> {
    (0..10)
        .map(|i| {
            let open = 100.0 + i as f64 * 0.05;
            Candle::new(open, open + 0.3, open - 0.1, open + 0.2, 60.0, at(i, 15))
        })
        .collect()
}
