//! Telegram Bot API transport.
//!
//! Delivers messages through the `sendMessage` endpoint in HTML parse mode.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};
use crate::models::Config;
use crate::services::notifier::Notifier;

const PARSE_MODE: &str = "HTML";

/// Sends messages via the Telegram Bot API.
pub struct TelegramNotifier {
    client: Client,
    endpoint: String,
}

#[derive(Debug, Serialize)]
struct SendMessage<'a> {
    chat_id: &'a str,
    text: &'a str,
    parse_mode: &'a str,
    disable_notification: bool,
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    ok: bool,
    #[serde(default)]
    description: Option<String>,
}

impl TelegramNotifier {
    /// Build a notifier from the Telegram and HTTP settings.
    ///
    /// Delivery does not go through the scraping proxy.
    pub fn new(config: &Config) -> Result<Self> {
        let token = config
            .telegram
            .bot_token
            .as_deref()
            .filter(|t| !t.is_empty())
            .ok_or_else(|| AppError::config("Telegram bot token must not be empty"))?;

        let client = Client::builder()
            .timeout(Duration::from_secs(config.http.timeout_secs))
            .build()?;

        Ok(Self::with_client(client, &config.telegram.api_base, token))
    }

    pub fn with_client(client: Client, api_base: &str, token: &str) -> Self {
        Self {
            client,
            endpoint: Self::endpoint(api_base, token),
        }
    }

    fn endpoint(api_base: &str, token: &str) -> String {
        format!("{}/bot{}/sendMessage", api_base.trim_end_matches('/'), token)
    }
}

#[async_trait]
impl Notifier for TelegramNotifier {
    async fn send(&self, chat_id: &str, text: &str) -> Result<()> {
        let payload = SendMessage {
            chat_id,
            text,
            parse_mode: PARSE_MODE,
            disable_notification: false,
        };

        log::debug!("Sending Telegram message to {}", chat_id);
        let response = self.client.post(&self.endpoint).json(&payload).send().await?;
        let status = response.status();
        let body = response.text().await?;

        let parsed: Option<ApiResponse> = serde_json::from_str(&body).ok();
        match parsed {
            Some(api) if status.is_success() && api.ok => Ok(()),
            Some(api) => Err(AppError::telegram(
                chat_id,
                api.description
                    .unwrap_or_else(|| format!("HTTP status {}", status)),
            )),
            None => Err(AppError::telegram(
                chat_id,
                format!("HTTP status {}: {}", status, body),
            )),
        }
    }
}
