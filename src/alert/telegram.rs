//! Telegram Bot API alert sink

use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;
use std::time::Duration;
use tracing::debug;

use super::AlertSink;
use crate::config::TelegramConfig;
use crate::error::{Error, Result};

/// Telegram client for sending alerts
pub struct TelegramSink {
    client: Client,
    bot_token: String,
    api_base_url: String,
    parse_mode: String,
}

impl TelegramSink {
    pub fn new(config: &TelegramConfig) -> Result<Self> {
        if config.bot_token.is_empty() {
            return Err(Error::MissingEnvVar("BOT_TOKEN".to_string()));
        }

        let client = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .map_err(|e| Error::Internal(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            bot_token: config.bot_token.clone(),
            api_base_url: config.api_base_url.trim_end_matches('/').to_string(),
            parse_mode: config.parse_mode.clone(),
        })
    }

    fn send_message_url(&self) -> String {
        format!("{}/bot{}/sendMessage", self.api_base_url, self.bot_token)
    }
}

#[async_trait]
impl AlertSink for TelegramSink {
    async fn send(&self, chat_id: &str, text: &str) -> Result<()> {
        let mut payload = json!({
            "chat_id": chat_id,
            "text": text,
            "disable_web_page_preview": true,
        });
        if !self.parse_mode.is_empty() {
            payload["parse_mode"] = json!(self.parse_mode);
        }

        let response = self
            .client
            .post(self.send_message_url())
            .json(&payload)
            .send()
            .await
            .map_err(|e| Error::AlertDelivery(format!("Telegram request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::AlertDelivery(format!(
                "Telegram API error {}: {}",
                status, body
            )));
        }

        debug!(chat_id = %chat_id, "Telegram message sent");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_requires_bot_token() {
        let result = TelegramSink::new(&TelegramConfig::default());
        assert!(matches!(result, Err(Error::MissingEnvVar(_))));
    }

    #[test]
    fn test_send_message_url() {
        let sink = TelegramSink::new(&TelegramConfig {
            bot_token: "123:abc".to_string(),
            ..TelegramConfig::default()
        })
        .unwrap();
        assert_eq!(
            sink.send_message_url(),
            "https://api.telegram.org/bot123:abc/sendMessage"
        );
    }

    #[tokio::test]
    async fn test_unreachable_api_is_delivery_error() {
        let sink = TelegramSink::new(&TelegramConfig {
            bot_token: "123:abc".to_string(),
            api_base_url: "http://127.0.0.1:9".to_string(),
            timeout_ms: 500,
            ..TelegramConfig::default()
        })
        .unwrap();

        let err = sink.send("@chat", "hello").await.unwrap_err();
        assert!(matches!(err, Error::AlertDelivery(_)));
    }
}
