//! Response bodies of the dashboard API
//!
//! Field names follow what the dashboard front end reads (`type`, `time`,
//! `latency`), so several of them differ from the storage records.

use serde::{Deserialize, Serialize};

use crate::storage::schema::{MonitoredTarget, Notification, Severity};

/// Generic `{status: "success"}` acknowledgement
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusResponse {
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl StatusResponse {
    pub fn success() -> Self {
        Self {
            status: "success".to_string(),
            message: None,
        }
    }

    pub fn success_with(message: impl Into<String>) -> Self {
        Self {
            message: Some(message.into()),
            ..Self::success()
        }
    }
}

/// Reply to service creation and update
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceResponse {
    pub status: String,
    pub message: String,
    pub service: MonitoredTarget,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationsResponse {
    pub unread_count: usize,
    pub list: Vec<NotificationView>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationView {
    pub id: i64,
    pub title: String,
    pub message: String,
    #[serde(rename = "type")]
    pub severity: Severity,
    /// `HH:MM:SS` (UTC) as shown in the dashboard list
    pub time: String,
    /// Full RFC 3339 creation time
    pub created_at: String,
    pub read: bool,
}

impl From<Notification> for NotificationView {
    fn from(notification: Notification) -> Self {
        Self {
            id: notification.id,
            time: notification.created_at.format("%H:%M:%S").to_string(),
            created_at: notification.created_at.to_rfc3339(),
            title: notification.title,
            message: notification.message,
            severity: notification.severity,
            read: notification.read,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarkReadResponse {
    pub status: String,
    pub updated: usize,
}

/// Latency check against the fixed ping target
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PingResponse {
    /// `ok` or `error`
    pub status: String,
    /// Milliseconds, -1 when the target did not answer
    pub latency: f64,
    pub target: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: String,
    pub storage: StorageHealth,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageHealth {
    pub healthy: bool,
    pub message: String,
}
