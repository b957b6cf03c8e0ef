use serde::{Deserialize, Serialize};

use crate::config::ConfigError;
use crate::models::TrailingStop;

/// How the initial stop is placed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "method", rename_all = "snake_case")]
pub enum StopLossMethod {
    /// A buffer beyond the reference level.
    ReferenceBelow,
    /// Just beyond the compression low; long setups only, otherwise `ReferenceBelow`.
    CompressionLow { buffer: f64 },
    /// A multiple of ATR away from entry.
    Atr { period: usize, multiplier: f64 },
}

/// Widens the reference buffer when entry sits very close to the reference level.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ThinMargin {
    /// Gap between entry and reference, as a fraction of entry, below which the
    /// widened buffer applies.
    pub max_gap_pct: f64,
    pub multiplier: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RiskPolicy {
    pub method: StopLossMethod,
    pub below_pct: f64,
    pub buffer_multiplier: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thin_margin: Option<ThinMargin>,
    /// Long stops never sit above `entry * max_stop_fraction`.
    pub max_stop_fraction: f64,
    pub risk_reward_ratio: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trailing_stop: Option<TrailingStop>,
}

impl Default for RiskPolicy {
    fn default() -> Self {
        Self {
            method: StopLossMethod::ReferenceBelow,
            below_pct: 0.02,
            buffer_multiplier: 1.0,
            thin_margin: Some(ThinMargin {
                max_gap_pct: 0.005,
                multiplier: 1.5,
            }),
            max_stop_fraction: 0.99,
            risk_reward_ratio: 2.5,
            trailing_stop: None,
        }
    }
}

impl RiskPolicy {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.risk_reward_ratio.is_finite() && self.risk_reward_ratio > 0.0) {
            return Err(ConfigError::invariant("risk_reward_ratio must be > 0"));
        }
        if !(self.max_stop_fraction > 0.0 && self.max_stop_fraction < 1.0) {
            return Err(ConfigError::invariant("max_stop_fraction must be in (0, 1)"));
        }
        if !(self.below_pct.is_finite() && self.below_pct >= 0.0) {
            return Err(ConfigError::invariant("below_pct must be >= 0"));
        }
        if !(self.buffer_multiplier.is_finite() && self.buffer_multiplier > 0.0) {
            return Err(ConfigError::invariant("buffer_multiplier must be > 0"));
        }

        let mut widest = self.buffer_multiplier;
        if let Some(thin) = self.thin_margin {
            if !(thin.max_gap_pct >= 0.0 && thin.multiplier > 0.0) {
                return Err(ConfigError::invariant("thin_margin values must be positive"));
            }
            widest = widest.max(thin.multiplier);
        }
        if self.below_pct * widest >= 1.0 {
            return Err(ConfigError::invariant(
                "below_pct * buffer must stay below 1",
            ));
        }

        match self.method {
            StopLossMethod::ReferenceBelow => {}
            StopLossMethod::CompressionLow { buffer } => {
                if !(0.0..1.0).contains(&buffer) {
                    return Err(ConfigError::invariant("compression buffer must be in [0, 1)"));
                }
            }
            StopLossMethod::Atr { period, multiplier } => {
                if period == 0 || !(multiplier.is_finite() && multiplier > 0.0) {
                    return Err(ConfigError::invariant(
                        "atr period and multiplier must be > 0",
                    ));
                }
            }
        }

        if let Some(trailing) = self.trailing_stop {
            if !(trailing.activation_pct > 0.0 && trailing.trail_pct > 0.0 && trailing.trail_pct < 1.0)
            {
                return Err(ConfigError::invariant(
                    "trailing stop needs activation > 0 and 0 < trail < 1",
                ));
            }
        }

        Ok(())
    }
}
