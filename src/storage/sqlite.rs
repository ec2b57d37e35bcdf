//! SQLite storage backend implementation
//!
//! This module provides a SQLite-based implementation of the `StorageBackend` trait.
//!
//! ## Features
//!
//! - **Embedded**: No separate database server required
//! - **WAL mode**: Better concurrency for reads during writes
//! - **Connection pooling**: Efficient resource usage
//! - **Migrations**: Automatic schema versioning with sqlx
//!
//! ## Atomicity
//!
//! Every mutating operation is a single SQL statement. Partial target updates
//! use `COALESCE` so concurrent edits of different fields (e.g. a probe result
//! and a rename) never overwrite each other, and notification suppression is an
//! `INSERT ... SELECT ... WHERE NOT EXISTS`, which SQLite runs under one write
//! lock.

use std::path::Path;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::{
    SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteRow, SqliteSynchronous,
};
use sqlx::{Pool, Row, Sqlite};
use tracing::{debug, info, instrument, warn};

use super::backend::{HealthStatus, StorageBackend};
use super::error::{StorageError, StorageResult};
use super::schema::{
    AlertChannelConfig, MonitoredTarget, NewNotification, NewTarget, Notification, ProbeRecord,
    TargetPatch,
};

const TARGET_COLUMNS: &str = "id, name, url, kind, status, last_checked, response_time";

const NOTIFICATION_COLUMNS: &str = "id, title, message, severity, created_at, is_read";

/// SQLite storage backend
pub struct SqliteBackend {
    pool: Pool<Sqlite>,
    db_path: String,
}

impl SqliteBackend {
    /// Create a new SQLite backend
    ///
    /// This will:
    /// 1. Create the database file if it doesn't exist
    /// 2. Run migrations to create tables
    /// 3. Configure SQLite for WAL mode
    ///
    /// ## Example
    ///
    /// ```no_run
    /// # use netdash::storage::sqlite::SqliteBackend;
    /// # async fn example() -> anyhow::Result<()> {
    /// let backend = SqliteBackend::new("./netdash.db").await?;
    /// # Ok(())
    /// # }
    /// ```
    #[instrument(skip_all)]
    pub async fn new(db_path: impl AsRef<Path>) -> StorageResult<Self> {
        let db_path_str = db_path.as_ref().to_string_lossy().to_string();

        info!("initializing SQLite backend at: {}", db_path_str);

        let options = SqliteConnectOptions::new()
            .filename(&db_path_str)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            .busy_timeout(std::time::Duration::from_secs(30));

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await
            .map_err(|e| StorageError::ConnectionFailed(e.to_string()))?;

        debug!("running database migrations");
        sqlx::migrate!("./migrations").run(&pool).await?;

        info!("database migrations complete");

        Ok(Self {
            pool,
            db_path: db_path_str,
        })
    }

    fn timestamp_to_millis(dt: &DateTime<Utc>) -> i64 {
        dt.timestamp_millis()
    }

    fn millis_to_timestamp(millis: i64) -> DateTime<Utc> {
        DateTime::from_timestamp_millis(millis).unwrap_or_else(Utc::now)
    }

    fn target_from_row(row: &SqliteRow) -> StorageResult<MonitoredTarget> {
        let kind: String = row.try_get("kind")?;
        let status: String = row.try_get("status")?;

        Ok(MonitoredTarget {
            id: row.try_get("id")?,
            name: row.try_get("name")?,
            address: row.try_get("url")?,
            probe_kind: kind.parse().map_err(StorageError::CorruptRecord)?,
            status: status.parse().map_err(StorageError::CorruptRecord)?,
            last_checked: row
                .try_get::<Option<i64>, _>("last_checked")?
                .map(Self::millis_to_timestamp),
            latency_ms: row.try_get("response_time")?,
        })
    }

    fn notification_from_row(row: &SqliteRow) -> StorageResult<Notification> {
        let severity: String = row.try_get("severity")?;

        Ok(Notification {
            id: row.try_get("id")?,
            title: row.try_get("title")?,
            message: row.try_get("message")?,
            severity: severity.parse().map_err(StorageError::CorruptRecord)?,
            created_at: Self::millis_to_timestamp(row.try_get("created_at")?),
            read: row.try_get("is_read")?,
        })
    }
}

#[async_trait]
impl StorageBackend for SqliteBackend {
    #[instrument(skip(self))]
    async fn insert_target(&self, target: NewTarget) -> StorageResult<MonitoredTarget> {
        let row = sqlx::query(&format!(
            "INSERT INTO services (name, url, kind) VALUES (?, ?, ?) RETURNING {TARGET_COLUMNS}"
        ))
        .bind(&target.name)
        .bind(&target.address)
        .bind(target.probe_kind.as_str())
        .fetch_one(&self.pool)
        .await?;

        Self::target_from_row(&row)
    }

    #[instrument(skip(self))]
    async fn update_target(
        &self,
        id: i64,
        patch: TargetPatch,
    ) -> StorageResult<Option<MonitoredTarget>> {
        let row = sqlx::query(&format!(
            r#"
            UPDATE services SET
                name = COALESCE(?, name),
                url = COALESCE(?, url),
                kind = COALESCE(?, kind)
            WHERE id = ?
            RETURNING {TARGET_COLUMNS}
            "#
        ))
        .bind(patch.name)
        .bind(patch.address)
        .bind(patch.probe_kind.map(|k| k.as_str()))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(Self::target_from_row).transpose()
    }

    #[instrument(skip(self))]
    async fn delete_target(&self, id: i64) -> StorageResult<bool> {
        let result = sqlx::query("DELETE FROM services WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn get_target(&self, id: i64) -> StorageResult<Option<MonitoredTarget>> {
        let row = sqlx::query(&format!(
            "SELECT {TARGET_COLUMNS} FROM services WHERE id = ?"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(Self::target_from_row).transpose()
    }

    async fn list_targets(&self) -> StorageResult<Vec<MonitoredTarget>> {
        let rows = sqlx::query(&format!(
            "SELECT {TARGET_COLUMNS} FROM services ORDER BY id ASC"
        ))
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(Self::target_from_row).collect()
    }

    #[instrument(skip(self, record), fields(status = %record.status))]
    async fn record_probe(
        &self,
        id: i64,
        record: ProbeRecord,
    ) -> StorageResult<Option<MonitoredTarget>> {
        let row = sqlx::query(&format!(
            r#"
            UPDATE services SET status = ?, response_time = ?, last_checked = ?
            WHERE id = ?
            RETURNING {TARGET_COLUMNS}
            "#
        ))
        .bind(record.status.as_str())
        .bind(record.latency_ms)
        .bind(Self::timestamp_to_millis(&record.checked_at))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(Self::target_from_row).transpose()
    }

    #[instrument(skip(self, notification), fields(title = %notification.title))]
    async fn insert_notification_unless_recent(
        &self,
        notification: NewNotification,
        window: chrono::Duration,
    ) -> StorageResult<Option<Notification>> {
        let created_at = Self::timestamp_to_millis(&notification.created_at);
        let quiet_since = notification
            .created_at
            .checked_sub_signed(window)
            .map_or(i64::MIN, |since| Self::timestamp_to_millis(&since));

        let row = sqlx::query(&format!(
            r#"
            INSERT INTO notifications (title, message, severity, created_at, is_read)
            SELECT ?1, ?2, ?3, ?4, 0
            WHERE NOT EXISTS (
                SELECT 1 FROM notifications WHERE title = ?1 AND created_at > ?5
            )
            RETURNING {NOTIFICATION_COLUMNS}
            "#
        ))
        .bind(&notification.title)
        .bind(&notification.message)
        .bind(notification.severity.as_str())
        .bind(created_at)
        .bind(quiet_since)
        .fetch_optional(&self.pool)
        .await?;

        if row.is_none() {
            debug!("suppressed notification");
        }

        row.as_ref().map(Self::notification_from_row).transpose()
    }

    async fn recent_notifications(&self, limit: usize) -> StorageResult<Vec<Notification>> {
        let rows = sqlx::query(&format!(
            r#"
            SELECT {NOTIFICATION_COLUMNS} FROM notifications
            ORDER BY created_at DESC, id DESC
            LIMIT ?
            "#
        ))
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(Self::notification_from_row).collect()
    }

    async fn unread_count(&self) -> StorageResult<usize> {
        let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM notifications WHERE is_read = 0")
            .fetch_one(&self.pool)
            .await?;

        Ok(row.0 as usize)
    }

    #[instrument(skip(self))]
    async fn mark_all_read(&self) -> StorageResult<usize> {
        let result = sqlx::query("UPDATE notifications SET is_read = 1 WHERE is_read = 0")
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() as usize)
    }

    #[instrument(skip(self), fields(before = %before))]
    async fn prune_notifications(&self, before: DateTime<Utc>) -> StorageResult<usize> {
        let result = sqlx::query("DELETE FROM notifications WHERE created_at < ?")
            .bind(Self::timestamp_to_millis(&before))
            .execute(&self.pool)
            .await?;

        let deleted = result.rows_affected() as usize;
        info!("deleted {} old notifications", deleted);

        Ok(deleted)
    }

    async fn channel_config(&self, user_id: i64) -> StorageResult<AlertChannelConfig> {
        sqlx::query("INSERT OR IGNORE INTO alert_settings (user_id) VALUES (?)")
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        let row = sqlx::query(
            r#"
            SELECT theme, show_public_ip, telegram_bot_token, telegram_chat_id,
                   whatsapp_phone, whatsapp_apikey, notifications_enabled
            FROM alert_settings WHERE user_id = ?
            "#,
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(AlertChannelConfig {
            theme: row.try_get("theme")?,
            show_public_ip: row.try_get("show_public_ip")?,
            telegram_bot_token: row.try_get("telegram_bot_token")?,
            telegram_chat_id: row.try_get("telegram_chat_id")?,
            whatsapp_phone: row.try_get("whatsapp_phone")?,
            whatsapp_apikey: row.try_get("whatsapp_apikey")?,
            notifications_enabled: row.try_get("notifications_enabled")?,
        })
    }

    #[instrument(skip(self, config))]
    async fn save_channel_config(
        &self,
        user_id: i64,
        config: AlertChannelConfig,
    ) -> StorageResult<()> {
        sqlx::query(
            r#"
            INSERT INTO alert_settings (
                user_id, theme, show_public_ip, telegram_bot_token, telegram_chat_id,
                whatsapp_phone, whatsapp_apikey, notifications_enabled
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT (user_id) DO UPDATE SET
                theme = excluded.theme,
                show_public_ip = excluded.show_public_ip,
                telegram_bot_token = excluded.telegram_bot_token,
                telegram_chat_id = excluded.telegram_chat_id,
                whatsapp_phone = excluded.whatsapp_phone,
                whatsapp_apikey = excluded.whatsapp_apikey,
                notifications_enabled = excluded.notifications_enabled
            "#,
        )
        .bind(user_id)
        .bind(&config.theme)
        .bind(config.show_public_ip)
        .bind(&config.telegram_bot_token)
        .bind(&config.telegram_chat_id)
        .bind(&config.whatsapp_phone)
        .bind(&config.whatsapp_apikey)
        .bind(config.notifications_enabled)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    #[instrument(skip(self))]
    async fn health_check(&self) -> StorageResult<HealthStatus> {
        match sqlx::query("SELECT 1").fetch_one(&self.pool).await {
            Ok(_) => Ok(HealthStatus {
                healthy: true,
                message: format!("SQLite backend operational ({})", self.db_path),
            }),
            Err(e) => {
                warn!("health check failed: {}", e);
                Ok(HealthStatus {
                    healthy: false,
                    message: format!("health check failed: {}", e),
                })
            }
        }
    }

    async fn close(&self) -> StorageResult<()> {
        info!("closing SQLite backend");
        self.pool.close().await;
        Ok(())
    }
}
