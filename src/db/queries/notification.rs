// src/db/queries/notification.rs
use axum::{
    extract::{Extension, Query, State},
    http::StatusCode,
};

use crate::api::auth::{Claims, SecurityAddon};
use crate::app_state::AppState;
use crate::db::models::notification::{Notification, NotificationFilter};
use crate::utils::api_response::ApiResponse;

/// Get notifications for the current user, newest first
#[utoipa::path(
    get,
    path = "/notifications",
    params(NotificationFilter),
    responses(
        (status = 200, description = "Notifications retrieved", body = Vec<Notification>)
    ),
    tag = "Notifications",
    security(
        ("bearerAuth" = [])
    )
)]
pub async fn get_user_notifications(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Query(filter): Query<NotificationFilter>,
) -> ApiResponse<Vec<Notification>> {
    let notifications = state.notifications.for_user(&claims.sub, &filter).await;
    ApiResponse::success(StatusCode::OK, "Notifications retrieved", notifications)
}

use utoipa::OpenApi;
#[derive(OpenApi)]
#[openapi(
    paths(get_user_notifications),
    components(schemas(Notification, NotificationFilter)),
    tags(
        (name = "Notifications", description = "Per-user notification inbox")
    ),
    modifiers(&SecurityAddon)
)]
pub struct NotificationDoc;
