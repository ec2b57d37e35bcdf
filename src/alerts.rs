use std::sync::Arc;

use futures::future::join_all;
use reqwest::Client;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, instrument};

use crate::channels::{AlertChannel, TelegramChannel, WhatsAppChannel, format_alert};
use crate::config::ChannelEndpoints;
use crate::storage::schema::{AlertChannelConfig, Notification};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChannelResult {
    Sent,
    /// Credentials incomplete, nothing was sent
    Skipped,
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelOutcome {
    pub channel: &'static str,
    pub result: ChannelResult,
}

/// What happened to one notification across all channels
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DispatchReport {
    /// Set when the user disabled notifications; no channel was attempted
    pub disabled: bool,
    pub outcomes: Vec<ChannelOutcome>,
}

impl DispatchReport {
    pub fn result_for(&self, channel: &str) -> Option<&ChannelResult> {
        self.outcomes
            .iter()
            .find(|outcome| outcome.channel == channel)
            .map(|outcome| &outcome.result)
    }

    pub fn sent(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|outcome| outcome.result == ChannelResult::Sent)
            .count()
    }
}

/// Best-effort fan-out of notifications to the configured chat channels
///
/// Channels are attempted concurrently and independently. A failing channel
/// is logged and reported, never retried, and never affects the others or
/// the caller.
#[derive(Clone)]
pub struct AlertDispatcher {
    channels: Arc<Vec<Arc<dyn AlertChannel>>>,
}

impl AlertDispatcher {
    pub fn new(channels: Vec<Arc<dyn AlertChannel>>) -> Self {
        Self {
            channels: Arc::new(channels),
        }
    }

    /// Telegram and WhatsApp channels talking to the given endpoints
    pub fn with_endpoints(endpoints: &ChannelEndpoints) -> Self {
        let client = Client::new();

        Self::new(vec![
            Arc::new(TelegramChannel::new(
                client.clone(),
                &endpoints.telegram_api_base,
            )),
            Arc::new(WhatsAppChannel::new(client, &endpoints.whatsapp_api_url)),
        ])
    }

    #[instrument(skip_all, fields(title = %notification.title))]
    pub async fn dispatch(
        &self,
        notification: &Notification,
        config: &AlertChannelConfig,
    ) -> DispatchReport {
        if !config.notifications_enabled {
            debug!("notifications disabled, not dispatching");
            return DispatchReport {
                disabled: true,
                outcomes: Vec::new(),
            };
        }

        let text = format_alert(notification);

        let outcomes = join_all(self.channels.iter().map(|channel| {
            let text = &text;
            async move {
                let result = if !channel.is_configured(config) {
                    ChannelResult::Skipped
                } else {
                    match channel.send(config, text).await {
                        Ok(()) => {
                            info!("Successfully sent {} alert", channel.name());
                            ChannelResult::Sent
                        }
                        Err(e) => {
                            error!("Failed to send {} alert: {}", channel.name(), e);
                            ChannelResult::Failed(e.to_string())
                        }
                    }
                };

                ChannelOutcome {
                    channel: channel.name(),
                    result,
                }
            }
        }))
        .await;

        DispatchReport {
            disabled: false,
            outcomes,
        }
    }

    /// Dispatch on a background task; the caller does not wait for delivery
    pub fn spawn_dispatch(
        &self,
        notification: Notification,
        config: AlertChannelConfig,
    ) -> JoinHandle<DispatchReport> {
        let dispatcher = self.clone();
        tokio::spawn(async move { dispatcher.dispatch(&notification, &config).await })
    }
}
