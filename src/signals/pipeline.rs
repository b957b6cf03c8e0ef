//! Runs a pipeline variant over one instrument and prices the result.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::ConfigError;
use crate::models::{Candle, Direction, Signal, Timeframe};
use crate::risk::{RiskCalculator, RiskInput, RiskPolicy};
use crate::services::market_data::CandleFetcher;

use super::breakout::BreakoutConfig;
use super::fakeout::FakeoutConfig;
use super::stage::{Levels, Stage, StageResult};

/// The pattern a scan looks for.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "variant", rename_all = "snake_case")]
pub enum PipelineConfig {
    Breakout(BreakoutConfig),
    Fakeout(FakeoutConfig),
}

impl Default for PipelineConfig {
    fn default() -> Self {
        PipelineConfig::Breakout(BreakoutConfig::default())
    }
}

impl PipelineConfig {
    pub fn name(&self) -> &'static str {
        match self {
            PipelineConfig::Breakout(_) => "breakout",
            PipelineConfig::Fakeout(_) => "fakeout",
        }
    }

    pub fn direction(&self) -> Direction {
        match self {
            PipelineConfig::Breakout(_) => Direction::Long,
            PipelineConfig::Fakeout(_) => Direction::Short,
        }
    }

    pub fn slow_timeframe(&self) -> Timeframe {
        match self {
            PipelineConfig::Breakout(c) => c.slow_timeframe,
            PipelineConfig::Fakeout(c) => c.slow_timeframe,
        }
    }

    pub fn fast_timeframe(&self) -> Timeframe {
        match self {
            PipelineConfig::Breakout(c) => c.fast_timeframe,
            PipelineConfig::Fakeout(c) => c.fast_timeframe,
        }
    }

    pub fn slow_limit(&self) -> usize {
        match self {
            PipelineConfig::Breakout(c) => c.slow_limit,
            PipelineConfig::Fakeout(c) => c.slow_limit,
        }
    }

    pub fn fast_limit(&self) -> usize {
        match self {
            PipelineConfig::Breakout(c) => c.fast_limit,
            PipelineConfig::Fakeout(c) => c.fast_limit,
        }
    }

    /// Replace the slow and fast timeframes of whichever variant this is.
    pub fn set_timeframes(&mut self, slow: Timeframe, fast: Timeframe) {
        match self {
            PipelineConfig::Breakout(c) => {
                c.slow_timeframe = slow;
                c.fast_timeframe = fast;
            }
            PipelineConfig::Fakeout(c) => {
                c.slow_timeframe = slow;
                c.fast_timeframe = fast;
            }
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        match self {
            PipelineConfig::Breakout(c) => c.validate(),
            PipelineConfig::Fakeout(c) => c.validate(),
        }
    }

    /// Stages evaluated on the slow timeframe.
    pub fn screen(&self, slow: &[Candle]) -> StageResult {
        match self {
            PipelineConfig::Breakout(c) => c.screen(slow),
            PipelineConfig::Fakeout(c) => c.screen(slow),
        }
    }

    /// Stages evaluated on the fast timeframe, given the slow stages' levels.
    pub fn confirm(&self, fast: &[Candle], levels: Levels) -> StageResult {
        match self {
            PipelineConfig::Breakout(c) => c.retest(fast, levels),
            PipelineConfig::Fakeout(c) => c.momentum(fast, levels),
        }
    }
}

/// What one instrument's evaluation ended in.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Confirmed(Signal),
    Rejected(Stage),
    Failed { reason: String },
}

impl Outcome {
    pub fn failed(reason: impl Into<String>) -> Self {
        Outcome::Failed {
            reason: reason.into(),
        }
    }
}

/// A pipeline variant paired with the risk policy that prices its signals.
///
/// Holds no mutable state; evaluating the same candles twice gives the same
/// outcome.
#[derive(Debug, Clone)]
pub struct SignalPipeline {
    config: PipelineConfig,
    risk: RiskCalculator,
}

impl SignalPipeline {
    pub fn new(config: PipelineConfig, policy: RiskPolicy) -> Result<Self, ConfigError> {
        config.validate()?;
        let risk = RiskCalculator::new(policy)?;
        Ok(Self { config, risk })
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn risk(&self) -> &RiskCalculator {
        &self.risk
    }

    /// Evaluate already-fetched candles.
    pub fn evaluate(&self, symbol: &str, slow: &[Candle], fast: &[Candle]) -> Outcome {
        let screened = self.config.screen(slow);
        let Some(levels) = passed_levels(&screened) else {
            return Outcome::Rejected(screened.stage);
        };
        self.finish(symbol, slow, self.config.confirm(fast, levels))
    }

    /// Fetch and evaluate one symbol. The fast timeframe is only requested once
    /// the slow stages have passed.
    pub async fn run(&self, fetcher: &dyn CandleFetcher, symbol: &str) -> Outcome {
        let slow = match fetcher
            .fetch(symbol, self.config.slow_timeframe(), self.config.slow_limit())
            .await
        {
            Ok(candles) => candles,
            Err(e) => return Outcome::failed(format!("{} fetch: {e}", self.config.slow_timeframe())),
        };

        let screened = self.config.screen(&slow);
        let Some(levels) = passed_levels(&screened) else {
            debug!(symbol = %symbol, stage = %screened.stage, "rejected on slow timeframe");
            return Outcome::Rejected(screened.stage);
        };

        let fast = match fetcher
            .fetch(symbol, self.config.fast_timeframe(), self.config.fast_limit())
            .await
        {
            Ok(candles) => candles,
            Err(e) => return Outcome::failed(format!("{} fetch: {e}", self.config.fast_timeframe())),
        };

        self.finish(symbol, &slow, self.config.confirm(&fast, levels))
    }

    fn finish(&self, symbol: &str, slow: &[Candle], confirmed: StageResult) -> Outcome {
        let Some(levels) = passed_levels(&confirmed) else {
            return Outcome::Rejected(confirmed.stage);
        };
        let (Some(entry), Some(reference), Some(as_of)) =
            (levels.entry, levels.reference, levels.as_of)
        else {
            return Outcome::Rejected(confirmed.stage);
        };

        let direction = self.config.direction();
        let input = RiskInput {
            direction,
            entry_price: entry,
            reference_level: levels.stop_reference.unwrap_or(reference),
            compression_low: levels.compression_low,
            candles: Some(slow),
        };

        match self.risk.calculate(&input) {
            Ok(priced) => Outcome::Confirmed(Signal {
                symbol: symbol.to_string(),
                direction,
                variant: self.config.name().to_string(),
                reference_level: reference,
                entry_price: entry,
                stop_loss: priced.stop_loss,
                take_profit: priced.take_profit,
                risk_reward_ratio: self.risk.policy().risk_reward_ratio,
                trailing_stop: self.risk.policy().trailing_stop,
                as_of,
            }),
            Err(e) => Outcome::failed(format!("risk: {e}")),
        }
    }
}

fn passed_levels(result: &StageResult) -> Option<Levels> {
    if result.passed {
        result.levels
    } else {
        None
    }
}
