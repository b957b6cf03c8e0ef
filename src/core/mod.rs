//! Core application primitives (scan orchestration)

pub mod progress;
pub mod scanner;
pub mod stats;

pub use progress::*;
pub use scanner::*;
pub use stats::*;
