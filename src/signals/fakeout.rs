//! Fakeout-rejection variant: a failed breakout traps longs, then a short.

use serde::{Deserialize, Serialize};

use crate::config::ConfigError;
use crate::indicators::{latest_moving_average, moving_average, resistance};
use crate::models::candle::tail;
use crate::models::{Candle, Timeframe};

use super::stage::{Levels, Stage, StageResult};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FakeoutConfig {
    pub slow_timeframe: Timeframe,
    pub fast_timeframe: Timeframe,
    pub slow_limit: usize,
    pub fast_limit: usize,
    pub lookback: usize,
    /// The trap candle's high must exceed `resistance * pierce_multiplier`.
    pub pierce_multiplier: f64,
    pub volume_period: usize,
    pub min_volume_multiplier: f64,
    /// Upper wick must be at least `body * wick_body_ratio` to count as rejection.
    pub wick_body_ratio: f64,
    pub require_downtrend: bool,
    pub trend_period: usize,
}

impl Default for FakeoutConfig {
    fn default() -> Self {
        Self {
            slow_timeframe: Timeframe::H4,
            fast_timeframe: Timeframe::M15,
            slow_limit: 200,
            fast_limit: 100,
            lookback: 50,
            pierce_multiplier: 1.001,
            volume_period: 20,
            min_volume_multiplier: 1.2,
            wick_body_ratio: 2.0,
            require_downtrend: false,
            trend_period: 50,
        }
    }
}

impl FakeoutConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.lookback < 2 {
            return Err(ConfigError::invariant("lookback must be >= 2"));
        }
        if self.volume_period == 0 || self.volume_period > self.lookback {
            return Err(ConfigError::invariant("volume_period must be in 1..=lookback"));
        }
        if self.trend_period == 0 {
            return Err(ConfigError::invariant("trend_period must be > 0"));
        }
        if self.slow_limit < self.lookback {
            return Err(ConfigError::invariant("slow_limit must cover the lookback"));
        }
        if self.fast_limit == 0 {
            return Err(ConfigError::invariant("fast_limit must be > 0"));
        }
        if self.require_downtrend && self.trend_period > self.slow_limit {
            return Err(ConfigError::invariant(
                "trend_period must fit in slow_limit when require_downtrend is set",
            ));
        }
        if self.slow_timeframe.minutes() <= self.fast_timeframe.minutes() {
            return Err(ConfigError::invariant(
                "slow_timeframe must be longer than fast_timeframe",
            ));
        }
        for (name, value) in [
            ("pierce_multiplier", self.pierce_multiplier),
            ("min_volume_multiplier", self.min_volume_multiplier),
            ("wick_body_ratio", self.wick_body_ratio),
        ] {
            if !(value.is_finite() && value > 0.0) {
                return Err(ConfigError::invariant(format!("{name} must be > 0")));
            }
        }
        Ok(())
    }

    /// Final slow candle pierces resistance intrabar but closes back below it.
    pub fn trap(&self, slow: &[Candle]) -> StageResult {
        let Some(window) = tail(slow, self.lookback) else {
            return StageResult::reject(Stage::Trap);
        };
        let (Some(resistance), Some(last)) = (resistance(window), window.last()) else {
            return StageResult::reject(Stage::Trap);
        };

        let pierced = last.high > resistance * self.pierce_multiplier;
        let failed = last.close < resistance;

        StageResult::decide(
            Stage::Trap,
            pierced && failed,
            Levels {
                reference: Some(resistance),
                stop_reference: Some(last.high),
                ..Levels::default()
            },
        )
    }

    /// Volume or a rejection wick backs the trap, plus the optional trend filter.
    pub fn confirmation(&self, slow: &[Candle], levels: Levels) -> StageResult {
        let Some(window) = tail(slow, self.lookback) else {
            return StageResult::reject(Stage::Confirmation);
        };
        let Some(last) = window.last() else {
            return StageResult::reject(Stage::Confirmation);
        };

        let volumes: Vec<f64> = window.iter().map(|c| c.volume).collect();
        let volume_ok = latest_moving_average(&volumes, self.volume_period)
            .is_some_and(|ma| last.volume >= ma * self.min_volume_multiplier);

        let wick = last.upper_wick();
        let wick_ok = wick > 0.0 && wick >= last.body() * self.wick_body_ratio;

        let mut passed = volume_ok || wick_ok;
        if passed && self.require_downtrend {
            let closes: Vec<f64> = slow.iter().map(|c| c.close).collect();
            passed = moving_average(&closes, self.trend_period)
                .last()
                .copied()
                .flatten()
                .is_some_and(|ma| last.close < ma);
        }

        StageResult::decide(Stage::Confirmation, passed, levels)
    }

    /// Latest fast candle is bearish.
    pub fn momentum(&self, fast: &[Candle], levels: Levels) -> StageResult {
        let Some(last) = fast.last() else {
            return StageResult::reject(Stage::Momentum);
        };

        StageResult::decide(
            Stage::Momentum,
            last.is_bearish(),
            Levels {
                entry: Some(last.close),
                as_of: Some(last.timestamp),
                ..levels
            },
        )
    }

    pub fn screen(&self, slow: &[Candle]) -> StageResult {
        self.trap(slow)
            .and_then(|levels| self.confirmation(slow, levels))
    }
}
