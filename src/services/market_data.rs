//! Collaborator interfaces for instrument discovery and candle retrieval.

use async_trait::async_trait;

use crate::models::{Candle, Timeframe};

#[derive(Debug, thiserror::Error)]
pub enum MarketDataError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("API error ({status}): {body}")]
    Api { status: u16, body: String },

    #[error("malformed response: {0}")]
    Parse(String),

    #[error("invalid URL: {0}")]
    Url(#[from] url::ParseError),

    #[error("{0}")]
    Unavailable(String),
}

impl MarketDataError {
    /// Worth retrying: network trouble, throttling or a server-side failure.
    pub fn is_transient(&self) -> bool {
        match self {
            MarketDataError::Transport(e) => e.is_timeout() || e.is_connect() || e.is_request(),
            MarketDataError::Api { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }
}

/// Lists the symbols a scan should cover.
#[async_trait]
pub trait InstrumentUniverse: Send + Sync {
    async fn list(&self) -> Result<Vec<String>, MarketDataError>;
}

/// Fetches the most recent `limit` candles for a symbol, oldest first.
#[async_trait]
pub trait CandleFetcher: Send + Sync {
    async fn fetch(
        &self,
        symbol: &str,
        timeframe: Timeframe,
        limit: usize,
    ) -> Result<Vec<Candle>, MarketDataError>;
}

/// A fixed universe, for scans over a hand-picked list.
#[derive(Debug, Clone, Default)]
pub struct StaticUniverse {
    symbols: Vec<String>,
}

impl StaticUniverse {
    pub fn new<I, S>(symbols: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            symbols: symbols.into_iter().map(Into::into).collect(),
        }
    }
}

#[async_trait]
impl InstrumentUniverse for StaticUniverse {
    async fn list(&self) -> Result<Vec<String>, MarketDataError> {
        Ok(self.symbols.clone())
    }
}
