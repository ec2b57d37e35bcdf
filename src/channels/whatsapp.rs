use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, instrument};

use super::{AlertChannel, DispatchError, check_response};
use crate::storage::schema::AlertChannelConfig;

const SEND_TIMEOUT: Duration = Duration::from_secs(10);

/// CallMeBot-style WhatsApp gateway: one GET with `phone`, `text` and `apikey`
#[derive(Debug, Clone)]
pub struct WhatsAppChannel {
    client: Client,
    api_url: String,
}

impl WhatsAppChannel {
    pub fn new(client: Client, api_url: impl Into<String>) -> Self {
        Self {
            client,
            api_url: api_url.into(),
        }
    }
}

#[async_trait]
impl AlertChannel for WhatsAppChannel {
    fn name(&self) -> &'static str {
        "whatsapp"
    }

    fn is_configured(&self, config: &AlertChannelConfig) -> bool {
        config.whatsapp_credentials().is_some()
    }

    #[instrument(skip_all)]
    async fn send(&self, config: &AlertChannelConfig, text: &str) -> Result<(), DispatchError> {
        let (phone, apikey) = config
            .whatsapp_credentials()
            .ok_or(DispatchError::NotConfigured)?;

        let response = self
            .client
            .get(&self.api_url)
            .query(&[("phone", phone), ("text", text), ("apikey", apikey)])
            .timeout(SEND_TIMEOUT)
            .send()
            .await?;

        check_response(response).await?;
        debug!("whatsapp message delivered");
        Ok(())
    }
}
