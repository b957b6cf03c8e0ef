//! Structure indicators: resistance and window lows

pub mod levels;

pub use levels::*;
