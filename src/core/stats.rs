//! Outcome counters for one scan.

use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

use crate::signals::{Outcome, Stage};

/// How many instruments ended where. Every recorded outcome lands in exactly one
/// counter, so `total()` equals the number of outcomes recorded.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ScanStatistics {
    rejected: BTreeMap<Stage, usize>,
    errors: usize,
    confirmed: usize,
}

impl ScanStatistics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, outcome: &Outcome) {
        match outcome {
            Outcome::Confirmed(_) => self.confirmed += 1,
            Outcome::Rejected(stage) => *self.rejected.entry(*stage).or_default() += 1,
            Outcome::Failed { .. } => self.errors += 1,
        }
    }

    pub fn rejected_at(&self, stage: Stage) -> usize {
        self.rejected.get(&stage).copied().unwrap_or(0)
    }

    pub fn rejected(&self) -> usize {
        self.rejected.values().sum()
    }

    pub fn errors(&self) -> usize {
        self.errors
    }

    pub fn confirmed(&self) -> usize {
        self.confirmed
    }

    pub fn total(&self) -> usize {
        self.rejected() + self.errors + self.confirmed
    }
}

impl fmt::Display for ScanStatistics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "confirmed={} errors={}", self.confirmed, self.errors)?;
        for (stage, count) in &self.rejected {
            write!(f, " {stage}_rejected={count}")?;
        }
        Ok(())
    }
}
