//! In-memory storage backend (no persistence)
//!
//! Useful for:
//! - Testing without database dependencies
//! - Throwaway deployments (`"backend": "none"`)
//!
//! All state sits behind a single lock, so every trait method is atomic.

use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use tracing::debug;

use super::backend::{HealthStatus, StorageBackend};
use super::error::StorageResult;
use super::schema::{
    AlertChannelConfig, MonitoredTarget, NewNotification, NewTarget, Notification, ProbeRecord,
    TargetPatch, TargetStatus,
};

#[derive(Debug, Default)]
struct State {
    next_target_id: i64,
    targets: BTreeMap<i64, MonitoredTarget>,
    next_notification_id: i64,
    notifications: Vec<Notification>,
    settings: HashMap<i64, AlertChannelConfig>,
}

/// In-memory storage backend
#[derive(Debug, Default)]
pub struct MemoryBackend {
    state: RwLock<State>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl StorageBackend for MemoryBackend {
    async fn insert_target(&self, target: NewTarget) -> StorageResult<MonitoredTarget> {
        let mut state = self.state.write().await;
        state.next_target_id += 1;

        let target = MonitoredTarget {
            id: state.next_target_id,
            name: target.name,
            address: target.address,
            probe_kind: target.probe_kind,
            status: TargetStatus::Unknown,
            last_checked: None,
            latency_ms: 0.0,
        };
        state.targets.insert(target.id, target.clone());

        debug!("in-memory backend: registered target {}", target.id);
        Ok(target)
    }

    async fn update_target(
        &self,
        id: i64,
        patch: TargetPatch,
    ) -> StorageResult<Option<MonitoredTarget>> {
        let mut state = self.state.write().await;
        let Some(target) = state.targets.get_mut(&id) else {
            return Ok(None);
        };

        if let Some(name) = patch.name {
            target.name = name;
        }
        if let Some(address) = patch.address {
            target.address = address;
        }
        if let Some(kind) = patch.probe_kind {
            target.probe_kind = kind;
        }

        Ok(Some(target.clone()))
    }

    async fn delete_target(&self, id: i64) -> StorageResult<bool> {
        Ok(self.state.write().await.targets.remove(&id).is_some())
    }

    async fn get_target(&self, id: i64) -> StorageResult<Option<MonitoredTarget>> {
        Ok(self.state.read().await.targets.get(&id).cloned())
    }

    async fn list_targets(&self) -> StorageResult<Vec<MonitoredTarget>> {
        Ok(self.state.read().await.targets.values().cloned().collect())
    }

    async fn record_probe(
        &self,
        id: i64,
        record: ProbeRecord,
    ) -> StorageResult<Option<MonitoredTarget>> {
        let mut state = self.state.write().await;
        let Some(target) = state.targets.get_mut(&id) else {
            return Ok(None);
        };

        target.status = record.status;
        target.latency_ms = record.latency_ms;
        target.last_checked = Some(record.checked_at);

        Ok(Some(target.clone()))
    }

    async fn insert_notification_unless_recent(
        &self,
        notification: NewNotification,
        window: chrono::Duration,
    ) -> StorageResult<Option<Notification>> {
        let mut state = self.state.write().await;

        let latest = state
            .notifications
            .iter()
            .filter(|n| n.title == notification.title)
            .map(|n| n.created_at)
            .max();

        if let Some(latest) = latest
            && notification.created_at - latest < window
        {
            debug!("in-memory backend: suppressed '{}'", notification.title);
            return Ok(None);
        }

        state.next_notification_id += 1;
        let stored = Notification {
            id: state.next_notification_id,
            title: notification.title,
            message: notification.message,
            severity: notification.severity,
            created_at: notification.created_at,
            read: false,
        };
        state.notifications.push(stored.clone());

        Ok(Some(stored))
    }

    async fn recent_notifications(&self, limit: usize) -> StorageResult<Vec<Notification>> {
        let state = self.state.read().await;
        let mut notifications = state.notifications.clone();
        notifications.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| b.id.cmp(&a.id))
        });
        notifications.truncate(limit);
        Ok(notifications)
    }

    async fn unread_count(&self) -> StorageResult<usize> {
        let state = self.state.read().await;
        Ok(state.notifications.iter().filter(|n| !n.read).count())
    }

    async fn mark_all_read(&self) -> StorageResult<usize> {
        let mut state = self.state.write().await;
        let mut changed = 0;
        for notification in state.notifications.iter_mut().filter(|n| !n.read) {
            notification.read = true;
            changed += 1;
        }
        Ok(changed)
    }

    async fn prune_notifications(&self, before: DateTime<Utc>) -> StorageResult<usize> {
        let mut state = self.state.write().await;
        let count = state.notifications.len();
        state.notifications.retain(|n| n.created_at >= before);
        Ok(count - state.notifications.len())
    }

    async fn channel_config(&self, user_id: i64) -> StorageResult<AlertChannelConfig> {
        let mut state = self.state.write().await;
        Ok(state.settings.entry(user_id).or_default().clone())
    }

    async fn save_channel_config(
        &self,
        user_id: i64,
        config: AlertChannelConfig,
    ) -> StorageResult<()> {
        self.state.write().await.settings.insert(user_id, config);
        Ok(())
    }

    async fn health_check(&self) -> StorageResult<HealthStatus> {
        let state = self.state.read().await;
        Ok(HealthStatus {
            healthy: true,
            message: format!(
                "In-memory storage operational: {} targets, {} notifications",
                state.targets.len(),
                state.notifications.len()
            ),
        })
    }

    async fn close(&self) -> StorageResult<()> {
        debug!("closing in-memory backend (no-op)");
        Ok(())
    }
}
