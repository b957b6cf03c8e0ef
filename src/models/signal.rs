use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Long,
    Short,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Long => f.write_str("LONG"),
            Direction::Short => f.write_str("SHORT"),
        }
    }
}

/// How a downstream executor should trail the stop once the trade moves in favour.
///
/// This is an annotation only: it never changes the reported `stop_loss`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrailingStop {
    /// Favourable move, as a fraction of entry, before trailing starts.
    pub activation_pct: f64,
    /// Distance kept behind the running extreme, as a fraction.
    pub trail_pct: f64,
}

/// A confirmed setup with its trade levels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Signal {
    pub symbol: String,
    pub direction: Direction,
    /// Pipeline variant that produced the signal (`breakout` or `fakeout`).
    pub variant: String,
    /// Resistance for breakouts, resistance pierced by the trap for fakeouts.
    pub reference_level: f64,
    pub entry_price: f64,
    pub stop_loss: f64,
    pub take_profit: f64,
    pub risk_reward_ratio: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trailing_stop: Option<TrailingStop>,
    /// Timestamp of the candle whose close is the entry.
    pub as_of: DateTime<Utc>,
}

impl Signal {
    pub fn risk(&self) -> f64 {
        (self.entry_price - self.stop_loss).abs()
    }

    pub fn reward(&self) -> f64 {
        (self.take_profit - self.entry_price).abs()
    }
}
