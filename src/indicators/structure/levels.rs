//! Price levels derived from a lookback window

use crate::common::math;
use crate::models::Candle;

/// Highest high over every candle except the last one.
///
/// The last candle is the one being tested against the level, so it never
/// contributes. Needs at least two candles.
pub fn resistance(window: &[Candle]) -> Option<f64> {
    if window.len() < 2 {
        return None;
    }
    math::max_of(window[..window.len() - 1].iter().map(|c| c.high))
}

/// Lowest low over the whole window.
pub fn window_low(window: &[Candle]) -> Option<f64> {
    math::min_of(window.iter().map(|c| c.low))
}
