//! Range ratio: height of a consolidation relative to price

use crate::common::math;
use crate::models::Candle;

/// `(max(high) - min(low)) / last close` over the window.
///
/// `None` for an empty window or a non-positive last close.
pub fn range_ratio(window: &[Candle]) -> Option<f64> {
    let last = window.last()?;
    if last.close <= 0.0 {
        return None;
    }
    let high = math::max_of(window.iter().map(|c| c.high))?;
    let low = math::min_of(window.iter().map(|c| c.low))?;
    Some((high - low) / last.close)
}
