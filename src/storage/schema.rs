//! Records persisted by the storage backends
//!
//! Three kinds of records live in storage:
//!
//! - [`MonitoredTarget`] - one row per registered service, including the state
//!   written by the last poll cycle
//! - [`Notification`] - the append-only notification log
//! - [`AlertChannelConfig`] - per-user alert channel credentials and preferences
//!
//! Field names on the wire follow the dashboard's JSON format (`url`, `type`,
//! `response_time`), which is why some fields carry serde renames.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// How a target is checked
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProbeKind {
    Http,
    Ping,
}

impl ProbeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProbeKind::Http => "http",
            ProbeKind::Ping => "ping",
        }
    }
}

impl std::fmt::Display for ProbeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProbeKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "http" => Ok(ProbeKind::Http),
            "ping" => Ok(ProbeKind::Ping),
            other => Err(format!("unknown service type '{other}' (expected http or ping)")),
        }
    }
}

/// Last known state of a target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TargetStatus {
    #[default]
    Unknown,
    Up,
    Down,
}

impl TargetStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TargetStatus::Unknown => "Unknown",
            TargetStatus::Up => "Up",
            TargetStatus::Down => "Down",
        }
    }
}

impl std::fmt::Display for TargetStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TargetStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Unknown" => Ok(TargetStatus::Unknown),
            "Up" => Ok(TargetStatus::Up),
            "Down" => Ok(TargetStatus::Down),
            other => Err(format!("unknown target status '{other}'")),
        }
    }
}

/// A registered service and the state written by the last probe
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonitoredTarget {
    pub id: i64,

    /// Display label
    pub name: String,

    /// Hostname, IP or URL; interpreted by the probe
    #[serde(rename = "url")]
    pub address: String,

    #[serde(rename = "type")]
    pub probe_kind: ProbeKind,

    pub status: TargetStatus,

    /// `None` until the first probe
    pub last_checked: Option<DateTime<Utc>>,

    /// Round-trip time in milliseconds, 0 when down
    #[serde(rename = "response_time")]
    pub latency_ms: f64,
}

/// Fields required to register a target
#[derive(Debug, Clone, PartialEq)]
pub struct NewTarget {
    pub name: String,
    pub address: String,
    pub probe_kind: ProbeKind,
}

/// Partial update of a target's registry fields
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TargetPatch {
    pub name: Option<String>,
    pub address: Option<String>,
    pub probe_kind: Option<ProbeKind>,
}

/// Result of one probe, written onto a target as a unit
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProbeRecord {
    pub status: TargetStatus,
    pub latency_ms: f64,
    pub checked_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    #[default]
    Info,
    Warning,
    Danger,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Info => "info",
            Severity::Warning => "warning",
            Severity::Danger => "danger",
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Severity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "info" => Ok(Severity::Info),
            "warning" => Ok(Severity::Warning),
            "danger" => Ok(Severity::Danger),
            other => Err(format!("unknown severity '{other}'")),
        }
    }
}

/// One entry of the notification log
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    pub id: i64,

    /// Deduplication key
    pub title: String,

    pub message: String,

    #[serde(rename = "type")]
    pub severity: Severity,

    pub created_at: DateTime<Utc>,

    pub read: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewNotification {
    pub title: String,
    pub message: String,
    pub severity: Severity,
    pub created_at: DateTime<Utc>,
}

/// Per-user alert channel settings
///
/// Each channel needs both of its credentials to be set (and non-empty) before
/// anything is sent to it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AlertChannelConfig {
    pub theme: String,
    pub show_public_ip: bool,
    pub telegram_bot_token: Option<String>,
    pub telegram_chat_id: Option<String>,
    pub whatsapp_phone: Option<String>,
    pub whatsapp_apikey: Option<String>,
    pub notifications_enabled: bool,
}

impl Default for AlertChannelConfig {
    fn default() -> Self {
        Self {
            theme: "system".to_string(),
            show_public_ip: false,
            telegram_bot_token: None,
            telegram_chat_id: None,
            whatsapp_phone: None,
            whatsapp_apikey: None,
            notifications_enabled: true,
        }
    }
}

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

impl AlertChannelConfig {
    /// Defaults with dispatch switched off
    pub fn disabled() -> Self {
        Self {
            notifications_enabled: false,
            ..Default::default()
        }
    }

    /// `(bot_token, chat_id)` when both are configured
    pub fn telegram_credentials(&self) -> Option<(&str, &str)> {
        Some((present(&self.telegram_bot_token)?, present(&self.telegram_chat_id)?))
    }

    /// `(phone, apikey)` when both are configured
    pub fn whatsapp_credentials(&self) -> Option<(&str, &str)> {
        Some((present(&self.whatsapp_phone)?, present(&self.whatsapp_apikey)?))
    }
}
