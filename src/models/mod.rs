//! Shared data models spanning the scanner layers.

pub mod candle;
pub mod signal;
pub mod timeframe;

pub use candle::{Candle, CandleSeries};
pub use signal::{Direction, Signal, TrailingStop};
pub use timeframe::Timeframe;
