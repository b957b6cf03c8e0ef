//! Wire types for the futures REST endpoints.

use chrono::DateTime;
use serde::Deserialize;
use serde_json::Value;

use crate::models::Candle;
use crate::services::market_data::MarketDataError;

#[derive(Debug, Deserialize)]
pub struct ExchangeInfo {
    pub symbols: Vec<SymbolInfo>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SymbolInfo {
    pub symbol: String,
    #[serde(default)]
    pub contract_type: String,
    #[serde(default)]
    pub quote_asset: String,
    #[serde(default)]
    pub status: String,
}

impl SymbolInfo {
    /// Live USDT-margined perpetual.
    pub fn is_tradable_usdt_perpetual(&self) -> bool {
        self.contract_type == "PERPETUAL" && self.quote_asset == "USDT" && self.status == "TRADING"
    }
}

/// One kline row: `[openTime, open, high, low, close, volume, closeTime, ...]`,
/// prices and volume as decimal strings.
pub type KlineRow = Vec<Value>;

pub fn parse_kline(row: &[Value]) -> Result<Candle, MarketDataError> {
    if row.len() < 6 {
        return Err(MarketDataError::Parse(format!(
            "kline row has {} fields, expected at least 6",
            row.len()
        )));
    }

    let open_time = row[0]
        .as_i64()
        .ok_or_else(|| MarketDataError::Parse(format!("invalid open time: {}", row[0])))?;
    let timestamp = DateTime::from_timestamp_millis(open_time)
        .ok_or_else(|| MarketDataError::Parse(format!("open time out of range: {open_time}")))?;

    Ok(Candle::new(
        decimal(&row[1], "open")?,
        decimal(&row[2], "high")?,
        decimal(&row[3], "low")?,
        decimal(&row[4], "close")?,
        decimal(&row[5], "volume")?,
        timestamp,
    ))
}

fn decimal(value: &Value, field: &str) -> Result<f64, MarketDataError> {
    let parsed = match value {
        Value::String(s) => s.parse::<f64>().ok(),
        Value::Number(n) => n.as_f64(),
        _ => None,
    };
    parsed.ok_or_else(|| MarketDataError::Parse(format!("invalid {field}: {value}")))
}
