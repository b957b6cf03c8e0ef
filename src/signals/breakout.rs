//! Breakout-confirmation variant: compression, breakout on volume, retest.

use serde::{Deserialize, Serialize};

use crate::config::ConfigError;
use crate::indicators::{latest_moving_average, range_ratio, resistance, window_low};
use crate::models::candle::tail;
use crate::models::{Candle, Timeframe};

use super::stage::{Levels, Stage, StageResult};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BreakoutConfig {
    pub slow_timeframe: Timeframe,
    pub fast_timeframe: Timeframe,
    /// Candles requested per fetch on each timeframe.
    pub slow_limit: usize,
    pub fast_limit: usize,
    pub compression_window: usize,
    /// Compression passes while `range_ratio` stays below this.
    pub compression_max_ratio: f64,
    pub breakout_window: usize,
    /// Final close must exceed `resistance * price_multiplier`.
    pub price_multiplier: f64,
    pub volume_period: usize,
    pub volume_multiplier: f64,
    /// Retest low may dip to `resistance * retest_multiplier`.
    pub retest_multiplier: f64,
}

impl Default for BreakoutConfig {
    fn default() -> Self {
        Self {
            slow_timeframe: Timeframe::H4,
            fast_timeframe: Timeframe::M15,
            slow_limit: 200,
            fast_limit: 100,
            compression_window: 40,
            compression_max_ratio: 0.12,
            breakout_window: 50,
            price_multiplier: 1.002,
            volume_period: 20,
            volume_multiplier: 1.5,
            retest_multiplier: 0.995,
        }
    }
}

impl BreakoutConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.compression_window == 0 {
            return Err(ConfigError::invariant("compression_window must be > 0"));
        }
        if self.breakout_window < 2 {
            return Err(ConfigError::invariant("breakout_window must be >= 2"));
        }
        if self.volume_period == 0 || self.volume_period > self.breakout_window {
            return Err(ConfigError::invariant(
                "volume_period must be in 1..=breakout_window",
            ));
        }
        if self.slow_limit < self.compression_window.max(self.breakout_window) {
            return Err(ConfigError::invariant(
                "slow_limit must cover the compression and breakout windows",
            ));
        }
        if self.fast_limit == 0 {
            return Err(ConfigError::invariant("fast_limit must be > 0"));
        }
        if self.slow_timeframe.minutes() <= self.fast_timeframe.minutes() {
            return Err(ConfigError::invariant(
                "slow_timeframe must be longer than fast_timeframe",
            ));
        }
        for (name, value) in [
            ("compression_max_ratio", self.compression_max_ratio),
            ("price_multiplier", self.price_multiplier),
            ("volume_multiplier", self.volume_multiplier),
            ("retest_multiplier", self.retest_multiplier),
        ] {
            if !(value.is_finite() && value > 0.0) {
                return Err(ConfigError::invariant(format!("{name} must be > 0")));
            }
        }
        Ok(())
    }

    /// Tight consolidation over the trailing compression window.
    pub fn compression(&self, slow: &[Candle]) -> StageResult {
        let Some(window) = tail(slow, self.compression_window) else {
            return StageResult::reject(Stage::Compression);
        };
        let (Some(ratio), Some(low)) = (range_ratio(window), window_low(window)) else {
            return StageResult::reject(Stage::Compression);
        };

        let levels = Levels {
            compression_low: Some(low),
            ..Levels::default()
        };
        StageResult::decide(
            Stage::Compression,
            ratio < self.compression_max_ratio,
            levels,
        )
    }

    /// Final slow candle closes above prior resistance on expanded volume.
    pub fn breakout(&self, slow: &[Candle], levels: Levels) -> StageResult {
        let Some(window) = tail(slow, self.breakout_window) else {
            return StageResult::reject(Stage::Breakout);
        };
        let (Some(resistance), Some(last)) = (resistance(window), window.last()) else {
            return StageResult::reject(Stage::Breakout);
        };
        let volumes: Vec<f64> = window.iter().map(|c| c.volume).collect();
        let Some(volume_ma) = latest_moving_average(&volumes, self.volume_period) else {
            return StageResult::reject(Stage::Breakout);
        };

        let price_ok = last.close > resistance * self.price_multiplier;
        let volume_ok = last.volume > volume_ma * self.volume_multiplier;

        StageResult::decide(
            Stage::Breakout,
            price_ok && volume_ok,
            Levels {
                reference: Some(resistance),
                ..levels
            },
        )
    }

    /// Latest fast candle holds above resistance after a shallow pullback.
    pub fn retest(&self, fast: &[Candle], levels: Levels) -> StageResult {
        let (Some(last), Some(resistance)) = (fast.last(), levels.reference) else {
            return StageResult::reject(Stage::Retest);
        };

        let held = last.low >= resistance * self.retest_multiplier && last.close > resistance;

        StageResult::decide(
            Stage::Retest,
            held,
            Levels {
                entry: Some(last.close),
                as_of: Some(last.timestamp),
                ..levels
            },
        )
    }

    pub fn screen(&self, slow: &[Candle]) -> StageResult {
        self.compression(slow)
            .and_then(|levels| self.breakout(slow, levels))
    }
}
