//! REST client for instrument discovery and kline snapshots.

use async_trait::async_trait;
use backon::{ExponentialBuilder, Retryable};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

use crate::config::ExchangeConfig;
use crate::models::{Candle, CandleSeries, Timeframe};
use crate::services::market_data::{CandleFetcher, InstrumentUniverse, MarketDataError};

use super::messages::{parse_kline, ExchangeInfo, KlineRow};

pub const DEFAULT_BASE_URL: &str = "https://fapi.binance.com";
const EXCHANGE_INFO_PATH: &str = "/fapi/v1/exchangeInfo";
const KLINES_PATH: &str = "/fapi/v1/klines";
/// Upper bound the klines endpoint accepts per request.
const MAX_KLINES: usize = 1500;

pub struct BinanceFuturesClient {
    client: reqwest::Client,
    base_url: Url,
    max_retries: usize,
    min_backoff: Duration,
}

impl BinanceFuturesClient {
    pub fn new() -> Result<Self, MarketDataError> {
        Self::from_config(&ExchangeConfig::default())
    }

    pub fn from_config(config: &ExchangeConfig) -> Result<Self, MarketDataError> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()?;
        Ok(Self::with_client(Url::parse(&config.base_url)?, client)
            .with_retries(config.max_retries, config.min_backoff))
    }

    pub fn with_client(base_url: Url, client: reqwest::Client) -> Self {
        Self {
            client,
            base_url,
            max_retries: 3,
            min_backoff: Duration::from_millis(500),
        }
    }

    pub fn with_retries(mut self, max_retries: usize, min_backoff: Duration) -> Self {
        self.max_retries = max_retries;
        self.min_backoff = min_backoff;
        self
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, MarketDataError> {
        let url = self.base_url.join(path)?;
        let backoff = ExponentialBuilder::default()
            .with_min_delay(self.min_backoff)
            .with_max_times(self.max_retries);

        (|| async {
            let response = self.client.get(url.clone()).query(query).send().await?;
            let status = response.status();
            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                return Err(MarketDataError::Api {
                    status: status.as_u16(),
                    body,
                });
            }
            Ok(response.json::<T>().await?)
        })
        .retry(backoff)
        .when(MarketDataError::is_transient)
        .notify(|e: &MarketDataError, delay: Duration| {
            warn!(path = path, error = %e, delay_ms = delay.as_millis() as u64, "Retrying request");
        })
        .await
    }
}

#[async_trait]
impl InstrumentUniverse for BinanceFuturesClient {
    async fn list(&self) -> Result<Vec<String>, MarketDataError> {
        let info: ExchangeInfo = self.get_json(EXCHANGE_INFO_PATH, &[]).await?;
        let mut symbols: Vec<String> = info
            .symbols
            .into_iter()
            .filter(|s| s.is_tradable_usdt_perpetual())
            .map(|s| s.symbol)
            .collect();
        symbols.sort();
        symbols.dedup();
        Ok(symbols)
    }
}

#[async_trait]
impl CandleFetcher for BinanceFuturesClient {
    async fn fetch(
        &self,
        symbol: &str,
        timeframe: Timeframe,
        limit: usize,
    ) -> Result<Vec<Candle>, MarketDataError> {
        let limit = limit.clamp(1, MAX_KLINES);
        let query = [
            ("symbol", symbol.to_string()),
            ("interval", timeframe.as_str().to_string()),
            ("limit", limit.to_string()),
        ];
        let rows: Vec<KlineRow> = self.get_json(KLINES_PATH, &query).await?;

        let candles = rows
            .iter()
            .map(|row| parse_kline(row))
            .collect::<Result<Vec<_>, _>>()?;
        let series = CandleSeries::new(symbol, timeframe, candles);
        if !series.is_strictly_ordered() {
            return Err(MarketDataError::Parse(format!(
                "{symbol} {timeframe} candles are not in ascending time order"
            )));
        }

        debug!(
            symbol = %symbol,
            timeframe = %timeframe,
            count = series.candles.len(),
            "Fetched {} candles for {}",
            series.candles.len(),
            symbol
        );
        Ok(series.candles)
    }
}
