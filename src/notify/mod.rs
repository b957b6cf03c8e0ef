//! Delivery of confirmed signals to the operator.

pub mod format;
pub mod webhook;

use async_trait::async_trait;
use futures_util::future::join_all;
use std::sync::Arc;
use tracing::{error, info};

use crate::config::NotifyConfig;
use crate::models::Signal;

pub use webhook::{TelegramSink, WebhookSink};

#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("{channel} rejected the message ({status}): {body}")]
    Rejected {
        channel: &'static str,
        status: u16,
        body: String,
    },
}

/// Receives the final, sorted signal list of a scan.
#[async_trait]
pub trait ResultSink: Send + Sync {
    fn name(&self) -> &'static str;

    async fn on_signals(&self, signals: &[Signal]) -> Result<(), NotifyError>;
}

/// Writes the summary to the log.
pub struct LogSink;

#[async_trait]
impl ResultSink for LogSink {
    fn name(&self) -> &'static str {
        "log"
    }

    async fn on_signals(&self, signals: &[Signal]) -> Result<(), NotifyError> {
        info!(count = signals.len(), "{}", format::plain(signals));
        Ok(())
    }
}

/// Fans out to every configured sink concurrently. A failing sink is logged and
/// does not affect the others.
#[derive(Clone, Default)]
pub struct Notifier {
    sinks: Vec<Arc<dyn ResultSink>>,
}

impl Notifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Log sink always, plus webhook and telegram when configured.
    pub fn from_config(config: &NotifyConfig) -> Self {
        let mut notifier = Self::new().with_sink(Arc::new(LogSink));
        if let Some(url) = &config.webhook_url {
            notifier = notifier.with_sink(Arc::new(WebhookSink::new(url.clone())));
        }
        if let Some(telegram) = &config.telegram {
            notifier = notifier.with_sink(Arc::new(TelegramSink::new(
                telegram.bot_token.clone(),
                telegram.chat_id.clone(),
            )));
        }
        notifier
    }

    pub fn with_sink(mut self, sink: Arc<dyn ResultSink>) -> Self {
        self.sinks.push(sink);
        self
    }

    pub fn len(&self) -> usize {
        self.sinks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }
}

#[async_trait]
impl ResultSink for Notifier {
    fn name(&self) -> &'static str {
        "notifier"
    }

    async fn on_signals(&self, signals: &[Signal]) -> Result<(), NotifyError> {
        let deliveries = self.sinks.iter().map(|sink| async move {
            (sink.name(), sink.on_signals(signals).await)
        });

        for (name, result) in join_all(deliveries).await {
            match result {
                Ok(()) => info!(sink = name, "Notification sent via {}", name),
                Err(e) => error!(sink = name, error = %e, "Failed to send notification via {}", name),
            }
        }
        Ok(())
    }
}
