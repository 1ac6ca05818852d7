use axum::{
    extract::{Path, Query, State},
    routing::{get, post},
    Json, Router,
};
use market_core::{
    ids::NotificationId,
    service::{notifications::NotificationView, Page as Listing},
};
use serde::Serialize;

use crate::{
    error::ApiError,
    flash::{Flash, IncomingFlash, Page, Redirect},
    routes::PageQuery,
    session::CurrentUser,
    AppState,
};

#[derive(Debug, Serialize)]
pub struct UnreadCounts {
    pub notifications: u64,
    pub messages: u64,
}

/// GET /notifications
pub async fn list_notifications(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    flash: IncomingFlash,
    Query(query): Query<PageQuery>,
) -> Result<Page<Listing<NotificationView>>, ApiError> {
    let notifications = state
        .services
        .notifications
        .list(user.id, query.page.unwrap_or(1))
        .await?;
    Ok(Page::new(flash, notifications))
}

/// GET /notification/:id/redirect
pub async fn open_notification(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(notification_id): Path<NotificationId>,
) -> Result<Redirect, ApiError> {
    let target = state
        .services
        .notifications
        .open(user.id, notification_id)
        .await?;
    Ok(Redirect::to(target))
}

/// POST /notifications/read_all
pub async fn read_all(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Redirect, ApiError> {
    state.services.notifications.mark_all_read(user.id).await?;
    Ok(Redirect::to("/notifications").with(Flash::success("All notifications marked as read")))
}

/// GET /api/unread_counts
pub async fn unread_counts(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<UnreadCounts>, ApiError> {
    Ok(Json(UnreadCounts {
        notifications: state.services.notifications.unread_count(user.id).await?,
        messages: state.services.messages.unread_count(user.id).await?,
    }))
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/notifications", get(list_notifications))
        .route("/notification/:id/redirect", get(open_notification))
        .route("/notifications/read_all", post(read_all))
        .route("/api/unread_counts", get(unread_counts))
}
