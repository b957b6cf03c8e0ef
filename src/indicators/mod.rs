//! Windowed indicator primitives used by the signal pipeline and risk layer.

pub mod structure;
pub mod trend;
pub mod volatility;

pub use structure::{resistance, window_low};
pub use trend::{latest_moving_average, moving_average};
pub use volatility::{average_true_range, average_true_range_default, range_ratio};
