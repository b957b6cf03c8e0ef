//! Turns a setup's reference levels into stop-loss and take-profit prices.

use serde::{Deserialize, Serialize};

use crate::common::math;
use crate::config::ConfigError;
use crate::indicators::average_true_range;
use crate::models::{Candle, Direction};

use super::policy::{RiskPolicy, StopLossMethod};

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RiskError {
    #[error("{field} must be a positive finite price, got {value}")]
    InvalidPrice { field: &'static str, value: f64 },

    #[error("derived stop-loss {stop_loss} is not a usable price")]
    DegenerateStop { stop_loss: f64 },

    #[error("derived take-profit {take_profit} is not a usable price")]
    DegenerateTarget { take_profit: f64 },
}

#[derive(Debug, Clone, Copy)]
pub struct RiskInput<'a> {
    pub direction: Direction,
    pub entry_price: f64,
    /// Resistance for breakouts, the trap high for fakeouts.
    pub reference_level: f64,
    pub compression_low: Option<f64>,
    /// Candles for the ATR method.
    pub candles: Option<&'a [Candle]>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RiskLevels {
    pub stop_loss: f64,
    pub take_profit: f64,
}

#[derive(Debug, Clone)]
pub struct RiskCalculator {
    policy: RiskPolicy,
}

impl RiskCalculator {
    pub fn new(policy: RiskPolicy) -> Result<Self, ConfigError> {
        policy.validate()?;
        Ok(Self { policy })
    }

    pub fn policy(&self) -> &RiskPolicy {
        &self.policy
    }

    pub fn calculate(&self, input: &RiskInput<'_>) -> Result<RiskLevels, RiskError> {
        check_price("entry_price", input.entry_price)?;
        check_price("reference_level", input.reference_level)?;

        let stop_loss = self.clamp(input, self.raw_stop(input));
        if !(stop_loss.is_finite() && stop_loss > 0.0) {
            return Err(RiskError::DegenerateStop { stop_loss });
        }

        let entry = input.entry_price;
        let ratio = self.policy.risk_reward_ratio;
        let take_profit = match input.direction {
            Direction::Long => entry + (entry - stop_loss) * ratio,
            Direction::Short => entry - (stop_loss - entry) * ratio,
        };
        if !(take_profit.is_finite() && take_profit > 0.0) {
            return Err(RiskError::DegenerateTarget { take_profit });
        }

        Ok(RiskLevels {
            stop_loss,
            take_profit,
        })
    }

    fn raw_stop(&self, input: &RiskInput<'_>) -> f64 {
        match self.policy.method {
            StopLossMethod::ReferenceBelow => self.reference_stop(input),
            StopLossMethod::CompressionLow { buffer } => match (input.direction, input.compression_low) {
                (Direction::Long, Some(low)) if low > 0.0 => low * (1.0 - buffer),
                _ => self.reference_stop(input),
            },
            StopLossMethod::Atr { period, multiplier } => {
                let candles = input.candles.unwrap_or_default();
                if candles.len() < period + 1 {
                    return self.reference_stop(input);
                }
                let distance = average_true_range(candles, period) * multiplier;
                match input.direction {
                    Direction::Long => input.entry_price - distance,
                    Direction::Short => input.entry_price + distance,
                }
            }
        }
    }

    fn reference_stop(&self, input: &RiskInput<'_>) -> f64 {
        let buffer = self.policy.below_pct * self.buffer_multiplier(input);
        match input.direction {
            Direction::Long => input.reference_level * (1.0 - buffer),
            Direction::Short => input.reference_level * (1.0 + buffer),
        }
    }

    fn buffer_multiplier(&self, input: &RiskInput<'_>) -> f64 {
        let base = self.policy.buffer_multiplier;
        let Some(thin) = self.policy.thin_margin else {
            return base;
        };
        let gap = match input.direction {
            Direction::Long => input.entry_price - input.reference_level,
            Direction::Short => input.reference_level - input.entry_price,
        } / input.entry_price;

        if gap < thin.max_gap_pct {
            base.max(thin.multiplier)
        } else {
            base
        }
    }

    /// Keeps a long stop strictly below `entry * max_stop_fraction` and a short
    /// stop strictly above `entry * (2 - max_stop_fraction)`.
    fn clamp(&self, input: &RiskInput<'_>, stop: f64) -> f64 {
        let fraction = self.policy.max_stop_fraction;
        match input.direction {
            Direction::Long => {
                let cap = input.entry_price * fraction;
                if stop < cap {
                    stop
                } else {
                    math::next_below(cap)
                }
            }
            Direction::Short => {
                let floor = input.entry_price * (2.0 - fraction);
                if stop > floor {
                    stop
                } else {
                    math::next_above(floor)
                }
            }
        }
    }
}

fn check_price(field: &'static str, value: f64) -> Result<(), RiskError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(RiskError::InvalidPrice { field, value })
    }
}
