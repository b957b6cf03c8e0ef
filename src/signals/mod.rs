//! Staged pattern detection over an instrument's candles.

pub mod breakout;
pub mod fakeout;
pub mod pipeline;
pub mod stage;

pub use breakout::BreakoutConfig;
pub use fakeout::FakeoutConfig;
pub use pipeline::{Outcome, PipelineConfig, SignalPipeline};
pub use stage::{Levels, Stage, StageResult};
