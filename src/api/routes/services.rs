//! Service registry endpoints
//!
//! Listing services runs a poll cycle through the poller actor, so the
//! response always carries fresh probe results.

use axum::{
    Json,
    extract::{Path, State, rejection::JsonRejection},
};
use tracing::instrument;

use crate::api::{
    error::ApiResult,
    state::ApiState,
    types::{ServiceResponse, StatusResponse},
};
use crate::poller::ProbeOutcome;
use crate::registry::{CreateTarget, UpdateTarget};

/// GET /api/services
///
/// Probe every service once and return their current state
#[instrument(skip_all)]
pub async fn poll_services(State(state): State<ApiState>) -> ApiResult<Json<Vec<ProbeOutcome>>> {
    let channels = state.alert_channels().await;
    let outcomes = state.poller.run_cycle(channels).await?;
    Ok(Json(outcomes))
}

/// POST /api/services
pub async fn create_service(
    State(state): State<ApiState>,
    payload: Result<Json<CreateTarget>, JsonRejection>,
) -> ApiResult<Json<ServiceResponse>> {
    let Json(request) = payload?;
    let service = state.registry.create(request).await?;

    Ok(Json(ServiceResponse {
        status: "success".to_string(),
        message: "Service added".to_string(),
        service,
    }))
}

/// PUT /api/services
pub async fn update_service(
    State(state): State<ApiState>,
    payload: Result<Json<UpdateTarget>, JsonRejection>,
) -> ApiResult<Json<ServiceResponse>> {
    let Json(request) = payload?;
    let service = state.registry.update(request).await?;

    Ok(Json(ServiceResponse {
        status: "success".to_string(),
        message: "Service updated".to_string(),
        service,
    }))
}

/// DELETE /api/services/:id
pub async fn delete_service(
    State(state): State<ApiState>,
    Path(id): Path<i64>,
) -> ApiResult<Json<StatusResponse>> {
    state.registry.delete(id).await?;
    Ok(Json(StatusResponse::success()))
}
