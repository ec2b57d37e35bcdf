//! Reachability probes
//!
//! A probe performs exactly one check against a target and always produces a
//! [`ProbeResult`]. Transport failures of either kind (HTTP errors, ping
//! timeouts, missing `ping` binary) collapse into `Down` with a latency of 0,
//! so the poller never has to deal with errors from this layer.

use std::process::Stdio;
use std::time::{Duration, Instant};

use anyhow::Context;
use async_trait::async_trait;
use tokio::process::Command;
use tracing::{debug, instrument, trace, warn};

use crate::storage::schema::{ProbeKind, TargetStatus};
use crate::util::round_ms;

/// Extra time granted to the `ping` process on top of its own timeout flag
const PING_GRACE: Duration = Duration::from_millis(500);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeStatus {
    Up,
    Down,
}

impl From<ProbeStatus> for TargetStatus {
    fn from(status: ProbeStatus) -> Self {
        match status {
            ProbeStatus::Up => TargetStatus::Up,
            ProbeStatus::Down => TargetStatus::Down,
        }
    }
}

/// Outcome of a single probe
#[derive(Debug, Clone, PartialEq)]
pub struct ProbeResult {
    pub status: ProbeStatus,

    /// Milliseconds rounded to two decimals, 0 when down
    pub latency_ms: f64,

    /// Why the target is down, for logs and API consumers
    pub error: Option<String>,
}

impl ProbeResult {
    pub fn up(latency_ms: f64) -> Self {
        Self {
            status: ProbeStatus::Up,
            latency_ms: round_ms(latency_ms.max(0.0)),
            error: None,
        }
    }

    pub fn down(error: impl Into<String>) -> Self {
        Self {
            status: ProbeStatus::Down,
            latency_ms: 0.0,
            error: Some(error.into()),
        }
    }

    pub fn is_up(&self) -> bool {
        self.status == ProbeStatus::Up
    }
}

/// A single reachability check
#[async_trait]
pub trait Probe: Send + Sync {
    async fn probe(&self, kind: ProbeKind, address: &str) -> ProbeResult;
}

/// Probe backed by a shared HTTP client and the system `ping` binary
#[derive(Debug, Clone)]
pub struct NetworkProbe {
    /// HTTP client (reused across requests for efficiency)
    client: reqwest::Client,

    ping_timeout: Duration,
}

impl NetworkProbe {
    pub fn new(http_timeout: Duration, ping_timeout: Duration) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(http_timeout)
            .build()
            .context("failed to build HTTP client")?;

        Ok(Self {
            client,
            ping_timeout,
        })
    }

    #[instrument(skip(self))]
    async fn probe_http(&self, address: &str) -> ProbeResult {
        let url = normalize_http_url(address);
        trace!("checking {url}");

        let start = Instant::now();
        match self.client.get(&url).send().await {
            Ok(response) => {
                let elapsed = start.elapsed().as_secs_f64() * 1000.0;
                let status = response.status();
                if status == reqwest::StatusCode::OK {
                    ProbeResult::up(elapsed)
                } else {
                    debug!("{url} answered with {status}");
                    ProbeResult::down(format!("unexpected status code: {}", status.as_u16()))
                }
            }
            Err(e) => {
                warn!("{url}: request failed: {e}");
                ProbeResult::down(e.to_string())
            }
        }
    }

    #[instrument(skip(self))]
    async fn probe_ping(&self, address: &str) -> ProbeResult {
        let Some(host) = ping_host(address) else {
            return ProbeResult::down(format!("invalid ping host '{address}'"));
        };

        let mut command = Command::new("ping");
        command
            .args(ping_args(host, self.ping_timeout))
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true);

        let start = Instant::now();
        let result = tokio::time::timeout(self.ping_timeout + PING_GRACE, command.status()).await;
        let elapsed = start.elapsed().as_secs_f64() * 1000.0;

        match result {
            Ok(Ok(status)) if status.success() => ProbeResult::up(elapsed),
            Ok(Ok(status)) => {
                debug!("ping {host} exited with {status}");
                ProbeResult::down(format!("ping exited with {status}"))
            }
            Ok(Err(e)) => {
                warn!("failed to run ping: {e}");
                ProbeResult::down(format!("failed to run ping: {e}"))
            }
            Err(_) => {
                debug!("ping {host} timed out");
                ProbeResult::down("ping timed out")
            }
        }
    }
}

#[async_trait]
impl Probe for NetworkProbe {
    async fn probe(&self, kind: ProbeKind, address: &str) -> ProbeResult {
        match kind {
            ProbeKind::Http => self.probe_http(address).await,
            ProbeKind::Ping => self.probe_ping(address).await,
        }
    }
}

/// Prefix `http://` unless the address already carries an HTTP(S) scheme
pub fn normalize_http_url(address: &str) -> String {
    let address = address.trim();
    let lower = address.to_ascii_lowercase();
    if lower.starts_with("http://") || lower.starts_with("https://") {
        address.to_string()
    } else {
        format!("http://{address}")
    }
}

/// Reduce an address to the bare host handed to `ping`
///
/// Returns `None` for hosts that would be empty or could be read as a flag.
pub fn ping_host(address: &str) -> Option<&str> {
    let address = address.trim();
    let without_scheme = ["http://", "https://"]
        .iter()
        .find_map(|scheme| {
            address
                .get(..scheme.len())
                .filter(|prefix| prefix.eq_ignore_ascii_case(scheme))
                .map(|_| &address[scheme.len()..])
        })
        .unwrap_or(address);

    let host = without_scheme
        .split('/')
        .next()
        .unwrap_or_default()
        .trim();

    if host.is_empty() || host.starts_with('-') {
        None
    } else {
        Some(host)
    }
}

fn ping_args(host: &str, timeout: Duration) -> Vec<String> {
    if cfg!(target_os = "windows") {
        vec![
            "-n".into(),
            "1".into(),
            "-w".into(),
            timeout.as_millis().max(1).to_string(),
            host.into(),
        ]
    } else if cfg!(target_os = "macos") {
        vec![
            "-c".into(),
            "1".into(),
            "-t".into(),
            timeout.as_secs().max(1).to_string(),
            host.into(),
        ]
    } else {
        vec![
            "-c".into(),
            "1".into(),
            "-W".into(),
            timeout.as_secs().max(1).to_string(),
            host.into(),
        ]
    }
}
