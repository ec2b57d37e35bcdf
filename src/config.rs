use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use tracing::trace;

/// Storage backend configuration
#[derive(Debug, Clone, serde::Deserialize)]
#[serde(tag = "backend", rename_all = "lowercase")]
pub enum StorageConfig {
    /// In-memory storage (no persistence)
    #[serde(rename = "none")]
    None,

    /// SQLite database (default for most deployments)
    Sqlite {
        /// Path to the SQLite database file
        #[serde(default = "default_sqlite_path")]
        path: PathBuf,

        /// Notifications older than this are pruned (disabled when absent)
        retention_days: Option<u32>,
    },
}

impl Default for StorageConfig {
    fn default() -> Self {
        StorageConfig::Sqlite {
            path: default_sqlite_path(),
            retention_days: None,
        }
    }
}

impl StorageConfig {
    pub fn retention_days(&self) -> Option<u32> {
        match self {
            StorageConfig::None => None,
            StorageConfig::Sqlite { retention_days, .. } => *retention_days,
        }
    }
}

fn default_sqlite_path() -> PathBuf {
    PathBuf::from("./netdash.db")
}

#[derive(Debug, Clone, serde::Deserialize)]
pub struct Config {
    /// Storage configuration (defaults to SQLite in the working directory)
    pub storage: Option<StorageConfig>,

    #[serde(default)]
    pub api: ApiSettings,

    #[serde(default)]
    pub polling: PollingConfig,

    #[serde(default)]
    pub notifications: NotificationConfig,

    #[serde(default)]
    pub thresholds: Thresholds,

    #[serde(default)]
    pub channels: ChannelEndpoints,

    /// Host probed by `GET /api/ping`
    #[serde(default = "default_ping_target")]
    pub ping_target: String,

    /// User whose alert settings are used by the API and by timer-driven cycles
    #[serde(default = "default_user_id")]
    pub user_id: i64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            storage: None,
            api: ApiSettings::default(),
            polling: PollingConfig::default(),
            notifications: NotificationConfig::default(),
            thresholds: Thresholds::default(),
            channels: ChannelEndpoints::default(),
            ping_target: default_ping_target(),
            user_id: default_user_id(),
        }
    }
}

impl Config {
    /// Apply `NETDASH_ADDR`, `NETDASH_PORT` and `NETDASH_TOKEN` from the environment
    pub fn apply_env_overrides(&mut self) {
        if let Some(addr) = crate::util::get_addr() {
            self.api.bind_addr.set_ip(addr.into());
        }
        if let Some(port) = crate::util::get_port() {
            self.api.bind_addr.set_port(port);
        }
        if let Some(token) = crate::util::get_token() {
            self.api.auth_token = Some(token);
        }
    }
}

#[derive(Debug, Clone, serde::Deserialize)]
pub struct ApiSettings {
    #[serde(default = "default_bind_addr")]
    pub bind_addr: SocketAddr,
    pub auth_token: Option<String>,
    #[serde(default = "default_true")]
    pub enable_cors: bool,
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            auth_token: None,
            enable_cors: true,
        }
    }
}

#[derive(Debug, Clone, serde::Deserialize)]
pub struct PollingConfig {
    /// Seconds between timer-driven cycles; cycles only run on request when absent
    pub interval: Option<u64>,
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
    #[serde(default = "default_http_timeout")]
    pub http_timeout: u64,
    #[serde(default = "default_ping_timeout")]
    pub ping_timeout: u64,
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            interval: None,
            concurrency: default_concurrency(),
            http_timeout: default_http_timeout(),
            ping_timeout: default_ping_timeout(),
        }
    }
}

impl PollingConfig {
    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout.max(1))
    }

    pub fn ping_timeout(&self) -> Duration {
        Duration::from_secs(self.ping_timeout.max(1))
    }

    pub fn interval(&self) -> Option<Duration> {
        self.interval.filter(|&s| s > 0).map(Duration::from_secs)
    }
}

#[derive(Debug, Clone, serde::Deserialize)]
pub struct NotificationConfig {
    /// Seconds during which repeated notifications with the same title are dropped
    #[serde(default = "default_suppression_window")]
    pub suppression_window: u64,
    #[serde(default = "default_recent_limit")]
    pub recent_limit: usize,
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            suppression_window: default_suppression_window(),
            recent_limit: default_recent_limit(),
        }
    }
}

impl NotificationConfig {
    pub fn suppression_window(&self) -> Duration {
        Duration::from_secs(self.suppression_window)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, serde::Deserialize)]
pub struct Thresholds {
    #[serde(default = "default_threshold")]
    pub cpu_percent: f32,
    #[serde(default = "default_threshold")]
    pub memory_percent: f32,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            cpu_percent: default_threshold(),
            memory_percent: default_threshold(),
        }
    }
}

#[derive(Debug, Clone, serde::Deserialize)]
pub struct ChannelEndpoints {
    #[serde(default = "default_telegram_api_base")]
    pub telegram_api_base: String,
    #[serde(default = "default_whatsapp_api_url")]
    pub whatsapp_api_url: String,
}

impl Default for ChannelEndpoints {
    fn default() -> Self {
        Self {
            telegram_api_base: default_telegram_api_base(),
            whatsapp_api_url: default_whatsapp_api_url(),
        }
    }
}

fn default_bind_addr() -> SocketAddr {
    SocketAddr::from((crate::util::DEFAULT_ADDR, crate::util::DEFAULT_PORT))
}

fn default_true() -> bool {
    true
}

fn default_concurrency() -> usize {
    8
}

fn default_http_timeout() -> u64 {
    5
}

fn default_ping_timeout() -> u64 {
    2
}

fn default_suppression_window() -> u64 {
    300
}

fn default_recent_limit() -> usize {
    10
}

fn default_threshold() -> f32 {
    90.0
}

fn default_telegram_api_base() -> String {
    "https://api.telegram.org".to_string()
}

fn default_whatsapp_api_url() -> String {
    "https://api.callmebot.com/whatsapp.php".to_string()
}

fn default_ping_target() -> String {
    "8.8.8.8".to_string()
}

fn default_user_id() -> i64 {
    1
}

pub fn read_config_file(path: &str) -> anyhow::Result<Config> {
    let file_content = std::fs::read_to_string(path)?;
    serde_json::from_str(&file_content)
        .map_err(|e| anyhow::anyhow!("Invalid configuration file provided: {e}"))
        .inspect(|config| trace!("loaded config: {config:?}"))
}
