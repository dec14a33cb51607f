//! Telegram Bot API sink
//!
//! Sends the alert with `sendMessage`. The bot token is part of the URL, so
//! errors are stripped of their URL before they are logged or returned.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::config::NotifyConfig;
use crate::error::NotifyError;
use crate::notify::AlertSink;

#[derive(Debug, Serialize)]
struct SendMessageRequest<'a> {
    chat_id: &'a str,
    text: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    parse_mode: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
struct TelegramResponse {
    ok: bool,
    description: Option<String>,
}

pub struct TelegramSink {
    client: Client,
    api_url: String,
    token: String,
    chat_id: String,
    parse_mode: Option<String>,
}

impl TelegramSink {
    pub fn new(
        api_url: &str,
        token: String,
        chat_id: String,
        parse_mode: Option<String>,
    ) -> Result<Self, NotifyError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| NotifyError::DeliveryFailure(format!("failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            api_url: api_url.trim_end_matches('/').to_string(),
            token,
            chat_id,
            parse_mode: parse_mode.filter(|m| !m.trim().is_empty() && !m.eq_ignore_ascii_case("none")),
        })
    }

    /// Build from config plus `TELEGRAM_BOT_TOKEN` / `TELEGRAM_CHAT_ID`
    pub fn from_env(config: &NotifyConfig) -> Result<Self, NotifyError> {
        let token = resolve_env("TELEGRAM_BOT_TOKEN")
            .ok_or(NotifyError::MissingCredentials("TELEGRAM_BOT_TOKEN"))?;
        let chat_id = resolve_env("TELEGRAM_CHAT_ID")
            .ok_or(NotifyError::MissingCredentials("TELEGRAM_CHAT_ID"))?;

        Self::new(
            &config.telegram_api_url,
            token,
            chat_id,
            Some(config.parse_mode.clone()),
        )
    }

    fn endpoint(&self) -> String {
        format!("{}/bot{}/sendMessage", self.api_url, self.token)
    }

    fn interpret_response(status: u16, body: &str) -> Result<(), NotifyError> {
        let parsed: Option<TelegramResponse> = serde_json::from_str(body).ok();
        let ok = parsed.as_ref().map(|r| r.ok).unwrap_or(false);

        if (200..300).contains(&status) && ok {
            return Ok(());
        }

        let description = parsed
            .and_then(|r| r.description)
            .unwrap_or_else(|| body.chars().take(200).collect());
        Err(NotifyError::Rejected {
            status,
            description,
        })
    }
}

fn resolve_env(var: &str) -> Option<String> {
    std::env::var(var)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[async_trait]
impl AlertSink for TelegramSink {
    fn name(&self) -> &'static str {
        "Telegram"
    }

    async fn deliver(&self, text: &str) -> Result<(), NotifyError> {
        let payload = SendMessageRequest {
            chat_id: &self.chat_id,
            text,
            parse_mode: self.parse_mode.as_deref(),
        };

        let response = self
            .client
            .post(self.endpoint())
            .json(&payload)
            .send()
            .await?;

        let status = response.status().as_u16();
        let body = response.text().await?;
        Self::interpret_response(status, &body)?;

        tracing::info!(sink = %"Telegram", chars = text.chars().count(), "📨 Alert delivered");
        Ok(())
    }
}
