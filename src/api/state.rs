//! API shared state

use std::sync::Arc;

use tracing::error;

use crate::actors::PollerHandle;
use crate::config::Thresholds;
use crate::monitors::probe::Probe;
use crate::monitors::system::MetricsSource;
use crate::notifications::NotificationService;
use crate::registry::ServiceRegistry;
use crate::storage::StorageBackend;
use crate::storage::schema::AlertChannelConfig;

/// Shared state passed to all API handlers
#[derive(Clone)]
pub struct ApiState {
    pub registry: ServiceRegistry,

    /// Handle to the poller actor; every `GET /api/services` goes through it
    pub poller: PollerHandle,

    pub notifications: NotificationService,

    /// Alert settings live here
    pub storage: Arc<dyn StorageBackend>,

    pub metrics: Arc<dyn MetricsSource>,

    pub thresholds: Thresholds,

    /// Probe used by `GET /api/ping`
    pub probe: Arc<dyn Probe>,

    pub ping_target: String,

    /// The user all requests act on behalf of
    pub user_id: i64,

    /// Cap for `GET /api/notifications`
    pub recent_limit: usize,
}

impl ApiState {
    /// Alert settings of the current user
    ///
    /// Falls back to disabled alerts when the settings cannot be read, so the
    /// request itself still probes, records and answers.
    pub async fn alert_channels(&self) -> AlertChannelConfig {
        match self.storage.channel_config(self.user_id).await {
            Ok(channels) => channels,
            Err(e) => {
                error!("failed to load alert settings, alerts disabled for this request: {e}");
                AlertChannelConfig::disabled()
            }
        }
    }
}
