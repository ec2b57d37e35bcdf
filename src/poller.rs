//! One poll cycle over the service registry
//!
//! ```text
//! registry (id order) → probe (bounded, order kept) → record_probe → Down? → raise
//! ```
//!
//! Each target is handled in isolation: a storage or notification failure for
//! one target is logged and the rest of the cycle carries on. Cycles are not
//! serialized here; [`crate::actors::poller`] owns that.

use std::sync::Arc;

use chrono::Utc;
use futures::stream::{self, StreamExt};
use serde::Serialize;
use tracing::{debug, error, instrument, warn};

use crate::monitors::probe::{Probe, ProbeResult};
use crate::notifications::NotificationService;
use crate::storage::StorageBackend;
use crate::storage::schema::{
    AlertChannelConfig, MonitoredTarget, ProbeRecord, Severity, TargetStatus,
};

/// Current state of one target after a cycle
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProbeOutcome {
    #[serde(flatten)]
    pub target: MonitoredTarget,

    /// Why the probe failed, when it did
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

pub fn down_title(name: &str) -> String {
    format!("Service Down: {name}")
}

pub fn down_message(name: &str, address: &str) -> String {
    format!("Service {name} ({address}) is not responding.")
}

#[derive(Clone)]
pub struct HealthPoller {
    storage: Arc<dyn StorageBackend>,
    probe: Arc<dyn Probe>,
    notifications: NotificationService,
    concurrency: usize,
}

impl HealthPoller {
    pub fn new(
        storage: Arc<dyn StorageBackend>,
        probe: Arc<dyn Probe>,
        notifications: NotificationService,
        concurrency: usize,
    ) -> Self {
        Self {
            storage,
            probe,
            notifications,
            concurrency: concurrency.max(1),
        }
    }

    pub fn storage(&self) -> &Arc<dyn StorageBackend> {
        &self.storage
    }

    /// Probe every registered target once
    ///
    /// Returns the targets in registry order. Targets deleted while the cycle
    /// was running are left out. Fails only if the registry cannot be read.
    #[instrument(skip_all)]
    pub async fn run_cycle(
        &self,
        channels: &AlertChannelConfig,
    ) -> anyhow::Result<Vec<ProbeOutcome>> {
        let targets = self.storage.list_targets().await?;
        debug!("polling {} targets", targets.len());

        let outcomes: Vec<Option<ProbeOutcome>> = stream::iter(targets)
            .map(|target| self.check_target(target, channels))
            .buffered(self.concurrency)
            .collect()
            .await;

        Ok(outcomes.into_iter().flatten().collect())
    }

    async fn check_target(
        &self,
        target: MonitoredTarget,
        channels: &AlertChannelConfig,
    ) -> Option<ProbeOutcome> {
        let result = self.probe.probe(target.probe_kind, &target.address).await;
        let record = ProbeRecord {
            status: result.status.into(),
            latency_ms: result.latency_ms,
            checked_at: Utc::now(),
        };

        let current = match self.storage.record_probe(target.id, record).await {
            Ok(Some(updated)) => updated,
            Ok(None) => {
                debug!("service {} was deleted during the cycle", target.id);
                return None;
            }
            Err(e) => {
                error!("failed to store result for service {}: {e}", target.id);
                MonitoredTarget {
                    status: record.status,
                    latency_ms: record.latency_ms,
                    last_checked: Some(record.checked_at),
                    ..target
                }
            }
        };

        if current.status == TargetStatus::Down {
            self.raise_down(&current, &result, channels).await;
        }

        Some(ProbeOutcome {
            target: current,
            error: result.error,
        })
    }

    async fn raise_down(
        &self,
        target: &MonitoredTarget,
        result: &ProbeResult,
        channels: &AlertChannelConfig,
    ) {
        warn!(
            "service {} ({}) is down: {}",
            target.name,
            target.address,
            result.error.as_deref().unwrap_or("no details")
        );

        if let Err(e) = self
            .notifications
            .raise(
                &down_title(&target.name),
                &down_message(&target.name, &target.address),
                Severity::Danger,
                channels,
            )
            .await
        {
            error!("failed to raise notification for service {}: {e}", target.id);
        }
    }
}
