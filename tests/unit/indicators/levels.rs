//! Unit tests for resistance and window lows

use perpscan::indicators::{resistance, window_low};

use crate::candles::{candle, flat_series};

#[test]
fn test_resistance_excludes_last_candle() {
    let mut window = flat_series(10);
    window.push(candle(100.0, 150.0, 99.0, 140.0, 1.0, 10));
    assert_eq!(resistance(&window), Some(101.0));
}

#[test]
fn test_resistance_needs_two_candles() {
    assert_eq!(resistance(&flat_series(1)), None);
    assert_eq!(resistance(&[]), None);
}

#[test]
fn test_window_low() {
    let mut window = flat_series(5);
    window[2].low = 95.5;
    assert_eq!(window_low(&window), Some(95.5));
    assert_eq!(window_low(&[]), None);
}
