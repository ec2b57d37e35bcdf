//! Storage backend trait definition
//!
//! This module defines the core `StorageBackend` trait that all
//! storage implementations must implement.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::error::StorageResult;
use super::schema::{
    AlertChannelConfig, MonitoredTarget, NewNotification, NewTarget, Notification, ProbeRecord,
    TargetPatch,
};

/// Health status of the storage backend
#[derive(Debug, Clone)]
pub struct HealthStatus {
    /// Is the backend operational?
    pub healthy: bool,

    /// Human-readable status message
    pub message: String,
}

/// Trait for storage backends
///
/// Holds the service registry, the notification log and per-user alert
/// settings. Every mutating method is a single atomic operation from the
/// caller's point of view: concurrent callers never observe half-applied
/// updates and never lose each other's writes.
///
/// ## Thread Safety
///
/// Implementations must be `Send + Sync` as they are shared between the API
/// handlers and the poller actor.
#[async_trait]
pub trait StorageBackend: Send + Sync {
    // ========================================================================
    // Service registry
    // ========================================================================

    /// Register a new target with status `Unknown`
    async fn insert_target(&self, target: NewTarget) -> StorageResult<MonitoredTarget>;

    /// Apply a partial update to a target's registry fields
    ///
    /// Returns `None` if no target has this id.
    async fn update_target(
        &self,
        id: i64,
        patch: TargetPatch,
    ) -> StorageResult<Option<MonitoredTarget>>;

    /// Delete a target; returns `false` if no target has this id
    async fn delete_target(&self, id: i64) -> StorageResult<bool>;

    async fn get_target(&self, id: i64) -> StorageResult<Option<MonitoredTarget>>;

    /// All targets in registry order (ascending id)
    async fn list_targets(&self) -> StorageResult<Vec<MonitoredTarget>>;

    /// Write status, latency and check time onto a target in one operation
    ///
    /// Returns `None` if the target was deleted in the meantime.
    async fn record_probe(
        &self,
        id: i64,
        record: ProbeRecord,
    ) -> StorageResult<Option<MonitoredTarget>>;

    // ========================================================================
    // Notification log
    // ========================================================================

    /// Insert a notification unless one with the same title was created less
    /// than `window` before `notification.created_at`
    ///
    /// The lookup and the insert are atomic with respect to concurrent calls,
    /// so two racing calls for the same title never both insert. Returns
    /// `None` when the notification was suppressed.
    async fn insert_notification_unless_recent(
        &self,
        notification: NewNotification,
        window: chrono::Duration,
    ) -> StorageResult<Option<Notification>>;

    /// The `limit` newest notifications, newest first
    async fn recent_notifications(&self, limit: usize) -> StorageResult<Vec<Notification>>;

    async fn unread_count(&self) -> StorageResult<usize>;

    /// Mark every unread notification as read; returns how many changed
    async fn mark_all_read(&self) -> StorageResult<usize>;

    /// Delete notifications created before `before`; returns how many were deleted
    async fn prune_notifications(&self, before: DateTime<Utc>) -> StorageResult<usize>;

    // ========================================================================
    // Alert settings
    // ========================================================================

    /// Settings for a user, created with defaults on first access
    async fn channel_config(&self, user_id: i64) -> StorageResult<AlertChannelConfig>;

    async fn save_channel_config(
        &self,
        user_id: i64,
        config: AlertChannelConfig,
    ) -> StorageResult<()>;

    // ========================================================================
    // Maintenance
    // ========================================================================

    /// Check backend health
    async fn health_check(&self) -> StorageResult<HealthStatus>;

    /// Close the backend and release resources
    async fn close(&self) -> StorageResult<()>;
}
