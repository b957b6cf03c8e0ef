//! Pipeline stages and the levels they hand to one another.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// One step of a pipeline variant, in evaluation order within the variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Compression,
    Breakout,
    Retest,
    Trap,
    Confirmation,
    Momentum,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Compression => "compression",
            Stage::Breakout => "breakout",
            Stage::Retest => "retest",
            Stage::Trap => "trap",
            Stage::Confirmation => "confirmation",
            Stage::Momentum => "momentum",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Levels extracted so far. Each stage receives the previous stage's levels and
/// passes them on, filling in what it learned.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Levels {
    /// Resistance the setup is built around.
    pub reference: Option<f64>,
    /// Low of the compression window (breakout variant).
    pub compression_low: Option<f64>,
    /// Level the stop is derived from when it differs from `reference`
    /// (the trap bar's high in the fakeout variant).
    pub stop_reference: Option<f64>,
    pub entry: Option<f64>,
    pub as_of: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StageResult {
    pub stage: Stage,
    pub passed: bool,
    pub levels: Option<Levels>,
}

impl StageResult {
    pub fn pass(stage: Stage, levels: Levels) -> Self {
        Self {
            stage,
            passed: true,
            levels: Some(levels),
        }
    }

    pub fn reject(stage: Stage) -> Self {
        Self {
            stage,
            passed: false,
            levels: None,
        }
    }

    /// Pass or reject depending on `passed`, keeping `levels` only on a pass.
    pub fn decide(stage: Stage, passed: bool, levels: Levels) -> Self {
        if passed {
            Self::pass(stage, levels)
        } else {
            Self::reject(stage)
        }
    }

    /// Run the next stage with this stage's levels; short-circuits on rejection.
    pub fn and_then(self, next: impl FnOnce(Levels) -> StageResult) -> StageResult {
        match self.levels {
            Some(levels) if self.passed => next(levels),
            _ => self,
        }
    }
}
