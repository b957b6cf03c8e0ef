//! ATR (Average True Range) indicator

use crate::common::math;
use crate::models::Candle;

/// Average true range over the trailing `period` bars.
///
/// Each true range needs the previous close, so `period + 1` candles are
/// required; with fewer (or `period == 0`) this returns `0.0`.
pub fn average_true_range(candles: &[Candle], period: usize) -> f64 {
    if period == 0 || candles.len() < period + 1 {
        return 0.0;
    }

    let start = candles.len() - period;
    let total: f64 = (start..candles.len())
        .map(|i| math::true_range(candles[i].high, candles[i].low, candles[i - 1].close))
        .sum();

    total / period as f64
}

/// ATR with the conventional period (14)
pub fn average_true_range_default(candles: &[Candle]) -> f64 {
    average_true_range(candles, 14)
}
