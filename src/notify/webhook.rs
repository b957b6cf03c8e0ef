//! HTTP delivery channels: generic JSON webhook and Telegram bot.

use async_trait::async_trait;
use chrono::Utc;
use serde::Serialize;
use serde_json::json;

use crate::models::{Direction, Signal};

use super::{format, NotifyError, ResultSink};

const TELEGRAM_API: &str = "https://api.telegram.org";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SignalPayload<'a> {
    symbol: &'a str,
    direction: Direction,
    entry_price: f64,
    stop_loss: f64,
    take_profit: f64,
}

/// POSTs `{timestamp, count, results}` as JSON.
pub struct WebhookSink {
    client: reqwest::Client,
    url: String,
}

impl WebhookSink {
    pub fn new(url: impl Into<String>) -> Self {
        Self::with_client(url, reqwest::Client::new())
    }

    pub fn with_client(url: impl Into<String>, client: reqwest::Client) -> Self {
        Self {
            client,
            url: url.into(),
        }
    }
}

#[async_trait]
impl ResultSink for WebhookSink {
    fn name(&self) -> &'static str {
        "webhook"
    }

    async fn on_signals(&self, signals: &[Signal]) -> Result<(), NotifyError> {
        let results: Vec<SignalPayload<'_>> = signals
            .iter()
            .map(|s| SignalPayload {
                symbol: &s.symbol,
                direction: s.direction,
                entry_price: s.entry_price,
                stop_loss: s.stop_loss,
                take_profit: s.take_profit,
            })
            .collect();

        let payload = json!({
            "timestamp": Utc::now().to_rfc3339(),
            "count": results.len(),
            "results": results,
        });

        let response = self.client.post(&self.url).json(&payload).send().await?;
        check_status(self.name(), response).await
    }
}

/// Sends the HTML summary through the Bot API `sendMessage` method.
pub struct TelegramSink {
    client: reqwest::Client,
    base_url: String,
    bot_token: String,
    chat_id: String,
}

impl TelegramSink {
    pub fn new(bot_token: impl Into<String>, chat_id: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: TELEGRAM_API.to_string(),
            bot_token: bot_token.into(),
            chat_id: chat_id.into(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

#[async_trait]
impl ResultSink for TelegramSink {
    fn name(&self) -> &'static str {
        "telegram"
    }

    async fn on_signals(&self, signals: &[Signal]) -> Result<(), NotifyError> {
        let url = format!(
            "{}/bot{}/sendMessage",
            self.base_url.trim_end_matches('/'),
            self.bot_token
        );
        let body = json!({
            "chat_id": self.chat_id,
            "text": format::html(signals),
            "parse_mode": "HTML",
        });

        let response = self.client.post(url).json(&body).send().await?;
        check_status(self.name(), response).await
    }
}

async fn check_status(channel: &'static str, response: reqwest::Response) -> Result<(), NotifyError> {
    let status = response.status();
    if status.is_success() {
        return Ok(());
    }
    let body = response.text().await.unwrap_or_default();
    Err(NotifyError::Rejected {
        channel,
        status: status.as_u16(),
        body,
    })
}
