//! Batch scanner for breakout and fakeout setups on perpetual futures.
//!
//! A [`crate::core::Scanner`] fans the [`signals::SignalPipeline`] out over an
//! instrument universe on a bounded worker pool. Each instrument's candles go
//! through the staged pattern filters; survivors are priced by the
//! [`risk::RiskCalculator`] and handed to a [`notify::ResultSink`].

pub mod common;
pub mod config;
pub mod core;
pub mod indicators;
pub mod logging;
pub mod models;
pub mod notify;
pub mod risk;
pub mod services;
pub mod signals;

pub use crate::config::{ConfigError, ScannerConfig};
pub use crate::core::{ScanError, ScanReport, ScanStatistics, Scanner};
pub use crate::models::{Candle, Direction, Signal, Timeframe};
pub use crate::signals::{Outcome, PipelineConfig, SignalPipeline, Stage};
