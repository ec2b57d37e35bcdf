//! External chat channels that alerts are forwarded to
//!
//! Each channel reads its own credentials from the user's
//! [`AlertChannelConfig`]; a channel without complete credentials is skipped
//! by the dispatcher and never contacted.

use std::fmt;

use async_trait::async_trait;

use crate::storage::schema::{AlertChannelConfig, Notification};

pub mod telegram;
pub mod whatsapp;

pub use telegram::TelegramChannel;
pub use whatsapp::WhatsAppChannel;

#[derive(Debug)]
pub enum DispatchError {
    /// Credentials for the channel are missing or empty
    NotConfigured,

    /// The request never produced a response (timeout, DNS, refused)
    Transport(String),

    /// The remote answered with a non-2xx status
    Rejected { status: u16, body: String },
}

impl fmt::Display for DispatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DispatchError::NotConfigured => write!(f, "channel is not configured"),
            DispatchError::Transport(msg) => write!(f, "request failed: {msg}"),
            DispatchError::Rejected { status, body } => {
                write!(f, "rejected with status {status}: {body}")
            }
        }
    }
}

impl std::error::Error for DispatchError {}

impl From<reqwest::Error> for DispatchError {
    fn from(err: reqwest::Error) -> Self {
        DispatchError::Transport(err.to_string())
    }
}

/// Turn a non-2xx response into [`DispatchError::Rejected`]
pub(crate) async fn check_response(response: reqwest::Response) -> Result<(), DispatchError> {
    let status = response.status();
    if status.is_success() {
        return Ok(());
    }

    let body = response.text().await.unwrap_or_default();
    Err(DispatchError::Rejected {
        status: status.as_u16(),
        body,
    })
}

/// A destination for alert messages
#[async_trait]
pub trait AlertChannel: Send + Sync {
    /// Name used in logs and dispatch reports
    fn name(&self) -> &'static str;

    /// Whether the user has complete credentials for this channel
    fn is_configured(&self, config: &AlertChannelConfig) -> bool;

    /// Deliver one message; a single attempt, no retries
    async fn send(&self, config: &AlertChannelConfig, text: &str) -> Result<(), DispatchError>;
}

/// Message body shared by all channels (Markdown)
pub fn format_alert(notification: &Notification) -> String {
    format!(
        "🚨 *{}*\n\n{}\n\n_NetDashboard Alert_",
        notification.title, notification.message
    )
}
