//! Scanner configuration: defaults, environment overrides, validation.

use serde::{Deserialize, Serialize};
use std::env;
use std::str::FromStr;
use std::time::Duration;

use crate::core::{DEFAULT_CONCURRENCY, DEFAULT_PROGRESS_INTERVAL};
use crate::models::{Timeframe, TrailingStop};
use crate::risk::{RiskPolicy, StopLossMethod};
use crate::services::binance::rest::DEFAULT_BASE_URL;
use crate::signals::{BreakoutConfig, FakeoutConfig, PipelineConfig};

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid value for {name}: '{value}'")]
    InvalidVar { name: String, value: String },

    #[error("invalid configuration: {0}")]
    Invariant(String),
}

impl ConfigError {
    pub fn invariant(message: impl Into<String>) -> Self {
        ConfigError::Invariant(message.into())
    }
}

/// Deployment environment; `production`/`prod` switches logging to JSON.
pub fn get_environment() -> String {
    env::var("ENVIRONMENT").unwrap_or_else(|_| "sandbox".to_string())
}

pub fn is_production(environment: &str) -> bool {
    matches!(environment, "production" | "prod")
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExchangeConfig {
    pub base_url: String,
    pub request_timeout: Duration,
    pub max_retries: usize,
    pub min_backoff: Duration,
}

impl Default for ExchangeConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            request_timeout: Duration::from_secs(10),
            max_retries: 3,
            min_backoff: Duration::from_millis(500),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TelegramConfig {
    pub bot_token: String,
    pub chat_id: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotifyConfig {
    pub webhook_url: Option<String>,
    pub telegram: Option<TelegramConfig>,
}

/// Everything one scan run needs. Built once, never mutated during a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScannerConfig {
    pub concurrency: usize,
    pub progress_interval: Duration,
    pub pipeline: PipelineConfig,
    pub risk: RiskPolicy,
    pub exchange: ExchangeConfig,
    pub notify: NotifyConfig,
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            concurrency: DEFAULT_CONCURRENCY,
            progress_interval: DEFAULT_PROGRESS_INTERVAL,
            pipeline: PipelineConfig::default(),
            risk: RiskPolicy::default(),
            exchange: ExchangeConfig::default(),
            notify: NotifyConfig::default(),
        }
    }
}

impl ScannerConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Defaults overlaid with whatever `lookup` returns for the known variables.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let vars = Vars(&lookup);
        let mut config = Self::default();

        if let Some(concurrency) = vars.parse::<usize>("SCAN_CONCURRENCY")? {
            config.concurrency = concurrency;
        }
        if let Some(ms) = vars.parse::<u64>("SCAN_PROGRESS_INTERVAL_MS")? {
            config.progress_interval = Duration::from_millis(ms);
        }

        if let Some(variant) = vars.get("SCAN_VARIANT") {
            config.pipeline = match variant.as_str() {
                "breakout" => PipelineConfig::Breakout(BreakoutConfig::default()),
                "fakeout" => PipelineConfig::Fakeout(FakeoutConfig::default()),
                _ => return Err(vars.invalid("SCAN_VARIANT", &variant)),
            };
        }

        let slow = vars
            .parse::<Timeframe>("SCAN_SLOW_TIMEFRAME")?
            .unwrap_or(config.pipeline.slow_timeframe());
        let fast = vars
            .parse::<Timeframe>("SCAN_FAST_TIMEFRAME")?
            .unwrap_or(config.pipeline.fast_timeframe());
        config.pipeline.set_timeframes(slow, fast);

        if let Some(method) = vars.get("STOP_LOSS_METHOD") {
            config.risk.method = match method.as_str() {
                "reference" => StopLossMethod::ReferenceBelow,
                "compression_low" => StopLossMethod::CompressionLow {
                    buffer: vars.parse("COMPRESSION_STOP_BUFFER")?.unwrap_or(0.003),
                },
                "atr" => StopLossMethod::Atr {
                    period: vars.parse("ATR_PERIOD")?.unwrap_or(14),
                    multiplier: vars.parse("ATR_MULTIPLIER")?.unwrap_or(1.5),
                },
                _ => return Err(vars.invalid("STOP_LOSS_METHOD", &method)),
            };
        }
        if let Some(ratio) = vars.parse("RISK_REWARD_RATIO")? {
            config.risk.risk_reward_ratio = ratio;
        }
        if let Some(pct) = vars.parse("STOP_BELOW_PCT")? {
            config.risk.below_pct = pct;
        }
        match (
            vars.parse::<f64>("TRAILING_ACTIVATION_PCT")?,
            vars.parse::<f64>("TRAILING_DISTANCE_PCT")?,
        ) {
            (Some(activation_pct), Some(trail_pct)) => {
                config.risk.trailing_stop = Some(TrailingStop {
                    activation_pct,
                    trail_pct,
                });
            }
            (None, None) => {}
            _ => {
                return Err(ConfigError::invariant(
                    "TRAILING_ACTIVATION_PCT and TRAILING_DISTANCE_PCT must be set together",
                ))
            }
        }

        if let Some(url) = vars.get("BINANCE_FUTURES_URL") {
            config.exchange.base_url = url;
        }

        config.notify.webhook_url = vars.get("WEBHOOK_URL");
        if let (Some(bot_token), Some(chat_id)) =
            (vars.get("TELEGRAM_BOT_TOKEN"), vars.get("TELEGRAM_CHAT_ID"))
        {
            config.notify.telegram = Some(TelegramConfig { bot_token, chat_id });
        }

        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.concurrency == 0 {
            return Err(ConfigError::invariant("concurrency must be >= 1"));
        }
        if self.progress_interval.is_zero() {
            return Err(ConfigError::invariant("progress_interval must be > 0"));
        }
        self.pipeline.validate()?;
        self.risk.validate()
    }
}

struct Vars<'a, F>(&'a F);

impl<F> Vars<'_, F>
where
    F: Fn(&str) -> Option<String>,
{
    /// Present and non-blank.
    fn get(&self, name: &str) -> Option<String> {
        (self.0)(name)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    fn parse<T: FromStr>(&self, name: &str) -> Result<Option<T>, ConfigError> {
        match self.get(name) {
            Some(raw) => raw
                .parse::<T>()
                .map(Some)
                .map_err(|_| self.invalid(name, &raw)),
            None => Ok(None),
        }
    }

    fn invalid(&self, name: &str, value: &str) -> ConfigError {
        ConfigError::InvalidVar {
            name: name.to_string(),
            value: value.to_string(),
        }
    }
}
