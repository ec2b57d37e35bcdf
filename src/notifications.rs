//! Notification log with per-title suppression
//!
//! Raising a notification either creates it, in which case it is handed to
//! the [`AlertDispatcher`] on a background task, or drops it because a
//! notification with the same title was created within the suppression
//! window. The check and the insert are one storage operation, so concurrent
//! raises of one title create at most one record per window.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::task::JoinHandle;
use tokio::time::interval;
use tracing::{debug, error, info, instrument};

use crate::alerts::AlertDispatcher;
use crate::storage::StorageBackend;
use crate::storage::error::StorageResult;
use crate::storage::schema::{AlertChannelConfig, NewNotification, Notification, Severity};

const RETENTION_SWEEP_INTERVAL: Duration = Duration::from_secs(24 * 60 * 60);

#[derive(Debug, Clone, PartialEq)]
pub enum RaiseOutcome {
    Created(Notification),
    Suppressed,
}

#[derive(Clone)]
pub struct NotificationService {
    storage: Arc<dyn StorageBackend>,
    dispatcher: AlertDispatcher,
    window: chrono::Duration,
}

impl NotificationService {
    pub fn new(
        storage: Arc<dyn StorageBackend>,
        dispatcher: AlertDispatcher,
        window: Duration,
    ) -> Self {
        Self {
            storage,
            dispatcher,
            window: chrono::Duration::from_std(window).unwrap_or(chrono::Duration::MAX),
        }
    }

    pub async fn raise(
        &self,
        title: &str,
        message: &str,
        severity: Severity,
        channels: &AlertChannelConfig,
    ) -> StorageResult<RaiseOutcome> {
        self.raise_at(Utc::now(), title, message, severity, channels)
            .await
    }

    /// [`raise`](Self::raise) with an explicit creation time
    #[instrument(skip(self, message, channels))]
    pub async fn raise_at(
        &self,
        now: DateTime<Utc>,
        title: &str,
        message: &str,
        severity: Severity,
        channels: &AlertChannelConfig,
    ) -> StorageResult<RaiseOutcome> {
        let created = self
            .storage
            .insert_notification_unless_recent(
                NewNotification {
                    title: title.to_string(),
                    message: message.to_string(),
                    severity,
                    created_at: now,
                },
                self.window,
            )
            .await?;

        let Some(notification) = created else {
            debug!("suppressed within window");
            return Ok(RaiseOutcome::Suppressed);
        };

        info!("created notification {}", notification.id);
        self.dispatcher
            .spawn_dispatch(notification.clone(), channels.clone());

        Ok(RaiseOutcome::Created(notification))
    }

    /// The `limit` newest notifications, newest first
    pub async fn list_recent(&self, limit: usize) -> StorageResult<Vec<Notification>> {
        self.storage.recent_notifications(limit).await
    }

    pub async fn unread_count(&self) -> StorageResult<usize> {
        self.storage.unread_count().await
    }

    pub async fn mark_all_read(&self) -> StorageResult<usize> {
        let changed = self.storage.mark_all_read().await?;
        debug!("marked {changed} notifications as read");
        Ok(changed)
    }

    /// Delete notifications older than `retention`
    pub async fn prune(&self, retention: Duration) -> StorageResult<usize> {
        let retention = chrono::Duration::from_std(retention).unwrap_or(chrono::Duration::MAX);
        let cutoff = Utc::now()
            .checked_sub_signed(retention)
            .unwrap_or(DateTime::<Utc>::MIN_UTC);
        self.storage.prune_notifications(cutoff).await
    }
}

/// Prune old notifications now and then once a day
pub fn spawn_retention_task(service: NotificationService, retention_days: u32) -> JoinHandle<()> {
    let retention = Duration::from_secs(u64::from(retention_days) * 24 * 60 * 60);

    tokio::spawn(async move {
        let mut ticker = interval(RETENTION_SWEEP_INTERVAL);
        loop {
            ticker.tick().await;
            match service.prune(retention).await {
                Ok(deleted) => debug!("retention sweep removed {deleted} notifications"),
                Err(e) => error!("retention sweep failed: {e}"),
            }
        }
    })
}
