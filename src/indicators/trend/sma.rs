//! SMA (Simple Moving Average) series

use crate::common::math;

/// Simple moving average over `values`, one entry per input.
///
/// Entries before index `period - 1` are `None`. From there on each entry is the
/// mean of the trailing `period` values, current value included. Runs in O(n): a
/// running sum slides along the input and is re-anchored from the window once
/// every `period` steps so rounding error cannot accumulate across long series.
pub fn moving_average(values: &[f64], period: usize) -> Vec<Option<f64>> {
    let mut out = vec![None; values.len()];
    if period == 0 || values.len() < period {
        return out;
    }

    let divisor = period as f64;
    let mut sum: f64 = values[..period].iter().sum();
    out[period - 1] = Some(sum / divisor);

    for i in period..values.len() {
        if (i + 1) % period == 0 {
            sum = values[i + 1 - period..=i].iter().sum();
        } else {
            sum += values[i] - values[i - period];
        }
        out[i] = Some(sum / divisor);
    }

    out
}

/// Moving average at the last index only, `None` when there is not enough data.
pub fn latest_moving_average(values: &[f64], period: usize) -> Option<f64> {
    if period == 0 || values.len() < period {
        return None;
    }
    math::mean(&values[values.len() - period..])
}
