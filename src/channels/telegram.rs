use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use tracing::{debug, instrument};

use super::{AlertChannel, DispatchError, check_response};
use crate::storage::schema::AlertChannelConfig;

const SEND_TIMEOUT: Duration = Duration::from_secs(5);

/// Telegram Bot API `sendMessage`
#[derive(Debug, Clone)]
pub struct TelegramChannel {
    client: Client,
    api_base: String,
}

#[derive(Serialize)]
struct TelegramMessage<'a> {
    chat_id: &'a str,
    text: &'a str,
    parse_mode: &'a str,
}

impl TelegramChannel {
    pub fn new(client: Client, api_base: impl Into<String>) -> Self {
        Self {
            client,
            api_base: api_base.into().trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl AlertChannel for TelegramChannel {
    fn name(&self) -> &'static str {
        "telegram"
    }

    fn is_configured(&self, config: &AlertChannelConfig) -> bool {
        config.telegram_credentials().is_some()
    }

    #[instrument(skip_all)]
    async fn send(&self, config: &AlertChannelConfig, text: &str) -> Result<(), DispatchError> {
        let (bot_token, chat_id) = config
            .telegram_credentials()
            .ok_or(DispatchError::NotConfigured)?;

        let url = format!("{}/bot{bot_token}/sendMessage", self.api_base);
        let payload = TelegramMessage {
            chat_id,
            text,
            parse_mode: "Markdown",
        };

        let response = self
            .client
            .post(&url)
            .json(&payload)
            .timeout(SEND_TIMEOUT)
            .send()
            .await?;

        check_response(response).await?;
        debug!("telegram message delivered");
        Ok(())
    }
}
