//! Stop-loss and take-profit derivation for confirmed setups.

pub mod calculator;
pub mod policy;

pub use calculator::{RiskCalculator, RiskError, RiskInput, RiskLevels};
pub use policy::{RiskPolicy, StopLossMethod, ThinMargin};
