//! Notification log endpoints

use axum::{Json, extract::State};

use crate::api::{
    error::ApiResult,
    state::ApiState,
    types::{MarkReadResponse, NotificationView, NotificationsResponse},
};

/// GET /api/notifications
///
/// Newest notifications first, plus the number of unread ones
pub async fn list_notifications(
    State(state): State<ApiState>,
) -> ApiResult<Json<NotificationsResponse>> {
    let list = state.notifications.list_recent(state.recent_limit).await?;
    let unread_count = state.notifications.unread_count().await?;

    Ok(Json(NotificationsResponse {
        unread_count,
        list: list.into_iter().map(NotificationView::from).collect(),
    }))
}

/// POST /api/notifications/mark_read
pub async fn mark_read(State(state): State<ApiState>) -> ApiResult<Json<MarkReadResponse>> {
    let updated = state.notifications.mark_all_read().await?;

    Ok(Json(MarkReadResponse {
        status: "success".to_string(),
        updated,
    }))
}
