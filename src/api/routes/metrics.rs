//! Host metrics endpoint

use axum::{Json, extract::State};
use tracing::{debug, error, instrument};

use crate::SystemMetrics;
use crate::api::{error::ApiResult, state::ApiState};
use crate::monitors::thresholds;
use crate::notifications::RaiseOutcome;

/// GET /api/metrics
///
/// Sample the host and raise threshold notifications for the sample
#[instrument(skip_all)]
pub async fn get_metrics(State(state): State<ApiState>) -> ApiResult<Json<SystemMetrics>> {
    let metrics = state.metrics.sample().await?;

    let anomalies = thresholds::evaluate(&metrics, &state.thresholds);
    if !anomalies.is_empty() {
        let channels = state.alert_channels().await;

        for anomaly in anomalies {
            match state
                .notifications
                .raise(anomaly.title, &anomaly.message, anomaly.severity, &channels)
                .await
            {
                Ok(RaiseOutcome::Created(_)) => debug!("raised '{}'", anomaly.title),
                Ok(RaiseOutcome::Suppressed) => {}
                Err(e) => error!("failed to raise '{}': {e}", anomaly.title),
            }
        }
    }

    Ok(Json(metrics))
}
