//! Alert settings of the current user

use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
};
use tracing::info;

use crate::api::{error::ApiResult, state::ApiState, types::StatusResponse};
use crate::storage::schema::AlertChannelConfig;

/// GET /api/settings
pub async fn get_settings(State(state): State<ApiState>) -> ApiResult<Json<AlertChannelConfig>> {
    Ok(Json(state.storage.channel_config(state.user_id).await?))
}

/// POST /api/settings
///
/// Replaces the whole settings record; omitted fields fall back to defaults
pub async fn update_settings(
    State(state): State<ApiState>,
    payload: Result<Json<AlertChannelConfig>, JsonRejection>,
) -> ApiResult<Json<StatusResponse>> {
    let Json(settings) = payload?;
    state
        .storage
        .save_channel_config(state.user_id, settings)
        .await?;

    info!("alert settings updated for user {}", state.user_id);
    Ok(Json(StatusResponse::success_with("Settings saved")))
}
