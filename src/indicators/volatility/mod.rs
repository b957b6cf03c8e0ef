//! Volatility indicators: ATR, range ratio

pub mod atr;
pub mod range;

pub use atr::*;
pub use range::*;
