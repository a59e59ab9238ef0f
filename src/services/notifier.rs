use std::future::Future;
use std::time::Duration;

use serde::Deserialize;
use serde_json::json;
use thiserror::Error;

const TELEGRAM_API_BASE: &str = "https://api.telegram.org";

/// A send that did not land. Every variant is retried on the next poll cycle.
#[derive(Debug, Error)]
pub enum DeliveryError {
    #[error("transport error: {0}")]
    Transport(String),

    #[error("rate limited, retry after {retry_after:?}")]
    RateLimited { retry_after: Option<Duration> },

    #[error("rejected with status {status}: {description}")]
    Rejected { status: u16, description: String },
}

/// Send formatted text to a named destination. The only capability the
/// daemon needs from the messaging platform.
pub trait AlertSink {
    fn send_message(
        &self,
        destination: &str,
        text: &str,
    ) -> impl Future<Output = Result<(), DeliveryError>> + Send;
}

#[derive(Debug, Deserialize)]
struct TelegramResponse {
    #[serde(default)]
    ok: bool,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    parameters: Option<TelegramResponseParameters>,
}

#[derive(Debug, Deserialize)]
struct TelegramResponseParameters {
    #[serde(default)]
    retry_after: Option<u64>,
}

/// Telegram Bot API sender (Markdown parse mode).
#[derive(Debug, Clone)]
pub struct Notifier {
    http: reqwest::Client,
    api_base: String,
    bot_token: String,
}

impl Notifier {
    pub fn new(http: reqwest::Client, bot_token: String) -> Self {
        Self {
            http,
            api_base: TELEGRAM_API_BASE.into(),
            bot_token,
        }
    }

    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into().trim_end_matches('/').to_string();
        self
    }

    /// Send a Markdown message to a channel (`@name`) or chat id.
    pub async fn send(&self, chat_id: &str, message: &str) -> Result<(), DeliveryError> {
        let url = format!("{}/bot{}/sendMessage", self.api_base, self.bot_token);

        let body = json!({
            "chat_id": chat_id,
            "text": message,
            "parse_mode": "Markdown",
        });

        let resp = self
            .http
            .post(&url)
            .json(&body)
            .send()
            .await
            // Strip the URL so the bot token never reaches the logs.
            .map_err(|e| DeliveryError::Transport(e.without_url().to_string()))?;

        let status = resp.status();
        let parsed: Option<TelegramResponse> = resp.json().await.ok();

        if status.is_success() && parsed.as_ref().map_or(true, |r| r.ok) {
            return Ok(());
        }

        let description = parsed
            .as_ref()
            .and_then(|r| r.description.clone())
            .unwrap_or_else(|| status.to_string());

        if status.as_u16() == 429 {
            let retry_after = parsed
                .and_then(|r| r.parameters)
                .and_then(|p| p.retry_after)
                .map(Duration::from_secs);
            return Err(DeliveryError::RateLimited { retry_after });
        }

        Err(DeliveryError::Rejected {
            status: status.as_u16(),
            description,
        })
    }
}

impl AlertSink for Notifier {
    async fn send_message(&self, destination: &str, text: &str) -> Result<(), DeliveryError> {
        self.send(destination, text).await
    }
}
