//! Helper functions for integration tests

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use netdash::actors::PollerHandle;
use netdash::alerts::AlertDispatcher;
use netdash::config::ChannelEndpoints;
use netdash::monitors::probe::{Probe, ProbeResult};
use netdash::notifications::NotificationService;
use netdash::poller::HealthPoller;
use netdash::registry::{CreateTarget, ServiceRegistry};
use chrono::{DateTime, Utc};
use netdash::storage::backend::HealthStatus;
use netdash::storage::memory::MemoryBackend;
use netdash::storage::schema::{
    AlertChannelConfig, MonitoredTarget, NewNotification, NewTarget, Notification, ProbeKind,
    ProbeRecord, TargetPatch,
};
use netdash::storage::{StorageBackend, StorageError, StorageResult};
use wiremock::MockServer;

pub const SUPPRESSION_WINDOW: Duration = Duration::from_secs(300);

/// Answers from a fixed table, `Up` with 5ms for unknown addresses
#[derive(Default)]
pub struct ScriptedProbe {
    results: HashMap<String, ProbeResult>,
}

impl ScriptedProbe {
    pub fn with(mut self, address: &str, result: ProbeResult) -> Self {
        self.results.insert(address.to_string(), result);
        self
    }
}

#[async_trait]
impl Probe for ScriptedProbe {
    async fn probe(&self, _kind: ProbeKind, address: &str) -> ProbeResult {
        self.results
            .get(address)
            .cloned()
            .unwrap_or_else(|| ProbeResult::up(5.0))
    }
}

/// Sleeps on every probe and records the highest number of probes in flight
pub struct TrackingProbe {
    delay: Duration,
    in_flight: AtomicUsize,
    pub max_in_flight: AtomicUsize,
    pub calls: AtomicUsize,
}

impl TrackingProbe {
    pub fn new(delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            delay,
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
            calls: AtomicUsize::new(0),
        })
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Probe for TrackingProbe {
    async fn probe(&self, _kind: ProbeKind, _address: &str) -> ProbeResult {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(current, Ordering::SeqCst);

        tokio::time::sleep(self.delay).await;

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        ProbeResult::up(self.delay.as_secs_f64() * 1000.0)
    }
}

/// In-memory storage with selected operations failing
#[derive(Default)]
pub struct FailingStorage {
    pub(crate) inner: MemoryBackend,
    /// `record_probe` fails for this target
    pub fail_record_for: Option<i64>,
    pub fail_notifications: bool,
    pub fail_settings: bool,
}

fn injected(operation: &str) -> StorageError {
    StorageError::QueryFailed(format!("injected failure in {operation}"))
}

#[async_trait]
impl StorageBackend for FailingStorage {
    async fn insert_target(&self, target: NewTarget) -> StorageResult<MonitoredTarget> {
        self.inner.insert_target(target).await
    }

    async fn update_target(
        &self,
        id: i64,
        patch: TargetPatch,
    ) -> StorageResult<Option<MonitoredTarget>> {
        self.inner.update_target(id, patch).await
    }

    async fn delete_target(&self, id: i64) -> StorageResult<bool> {
        self.inner.delete_target(id).await
    }

    async fn get_target(&self, id: i64) -> StorageResult<Option<MonitoredTarget>> {
        self.inner.get_target(id).await
    }

    async fn list_targets(&self) -> StorageResult<Vec<MonitoredTarget>> {
        self.inner.list_targets().await
    }

    async fn record_probe(
        &self,
        id: i64,
        record: ProbeRecord,
    ) -> StorageResult<Option<MonitoredTarget>> {
        if self.fail_record_for == Some(id) {
            return Err(injected("record_probe"));
        }
        self.inner.record_probe(id, record).await
    }

    async fn insert_notification_unless_recent(
        &self,
        notification: NewNotification,
        window: chrono::Duration,
    ) -> StorageResult<Option<Notification>> {
        if self.fail_notifications {
            return Err(injected("insert_notification_unless_recent"));
        }
        self.inner
            .insert_notification_unless_recent(notification, window)
            .await
    }

    async fn recent_notifications(&self, limit: usize) -> StorageResult<Vec<Notification>> {
        self.inner.recent_notifications(limit).await
    }

    async fn unread_count(&self) -> StorageResult<usize> {
        self.inner.unread_count().await
    }

    async fn mark_all_read(&self) -> StorageResult<usize> {
        self.inner.mark_all_read().await
    }

    async fn prune_notifications(&self, before: DateTime<Utc>) -> StorageResult<usize> {
        self.inner.prune_notifications(before).await
    }

    async fn channel_config(&self, user_id: i64) -> StorageResult<AlertChannelConfig> {
        if self.fail_settings {
            return Err(injected("channel_config"));
        }
        self.inner.channel_config(user_id).await
    }

    async fn save_channel_config(
        &self,
        user_id: i64,
        config: AlertChannelConfig,
    ) -> StorageResult<()> {
        self.inner.save_channel_config(user_id, config).await
    }

    async fn health_check(&self) -> StorageResult<HealthStatus> {
        self.inner.health_check().await
    }

    async fn close(&self) -> StorageResult<()> {
        self.inner.close().await
    }
}

/// Everything a poll cycle needs, wired to one storage backend
pub struct TestStack {
    pub storage: Arc<dyn StorageBackend>,
    pub registry: ServiceRegistry,
    pub notifications: NotificationService,
    pub poller: HealthPoller,
}

pub fn test_stack(
    storage: Arc<dyn StorageBackend>,
    probe: Arc<dyn Probe>,
    endpoints: &ChannelEndpoints,
) -> TestStack {
    let notifications = NotificationService::new(
        storage.clone(),
        AlertDispatcher::with_endpoints(endpoints),
        SUPPRESSION_WINDOW,
    );
    let poller = HealthPoller::new(storage.clone(), probe, notifications.clone(), 8);

    TestStack {
        registry: ServiceRegistry::new(storage.clone()),
        storage,
        notifications,
        poller,
    }
}

impl TestStack {
    pub fn spawn_poller(&self) -> PollerHandle {
        PollerHandle::spawn(self.poller.clone(), 1, None)
    }

    pub async fn register(&self, name: &str, url: &str, kind: &str) -> MonitoredTarget {
        self.registry
            .create(CreateTarget {
                name: Some(name.to_string()),
                url: Some(url.to_string()),
                kind: Some(kind.to_string()),
            })
            .await
            .unwrap()
    }
}

/// Channel endpoints pointing both chat services at the mock server
pub fn mock_endpoints(server: &MockServer) -> ChannelEndpoints {
    ChannelEndpoints {
        telegram_api_base: server.uri(),
        whatsapp_api_url: format!("{}/whatsapp.php", server.uri()),
    }
}

pub fn telegram_only() -> AlertChannelConfig {
    AlertChannelConfig {
        telegram_bot_token: Some("123:abc".to_string()),
        telegram_chat_id: Some("42".to_string()),
        ..Default::default()
    }
}

pub fn both_channels() -> AlertChannelConfig {
    AlertChannelConfig {
        whatsapp_phone: Some("+34600000000".to_string()),
        whatsapp_apikey: Some("key".to_string()),
        ..telegram_only()
    }
}

/// Wait until the mock server has seen `count` requests (or 2 seconds passed)
pub async fn wait_for_requests(server: &MockServer, count: usize) -> usize {
    let deadline = tokio::time::Instant::now() + Duration::from_secs(2);
    loop {
        let received = server.received_requests().await.map_or(0, |r| r.len());
        if received >= count || tokio::time::Instant::now() >= deadline {
            return received;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}
