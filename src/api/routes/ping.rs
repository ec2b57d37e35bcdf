//! Internet connectivity check

use axum::{Json, extract::State};

use crate::api::{state::ApiState, types::PingResponse};
use crate::storage::schema::ProbeKind;

/// GET /api/ping
///
/// Ping the configured well-known host; never fails, reports `error` instead
pub async fn ping(State(state): State<ApiState>) -> Json<PingResponse> {
    let result = state.probe.probe(ProbeKind::Ping, &state.ping_target).await;

    let response = if result.is_up() {
        PingResponse {
            status: "ok".to_string(),
            latency: result.latency_ms,
            target: state.ping_target,
            error: None,
        }
    } else {
        PingResponse {
            status: "error".to_string(),
            latency: -1.0,
            target: state.ping_target,
            error: result.error,
        }
    };

    Json(response)
}
