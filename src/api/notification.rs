// src/api/notification.rs
use crate::app_state::AppState;
use crate::db::queries::notification::*;
use axum::{routing::get, Router};

pub fn notification_routes() -> Router<AppState> {
    Router::new().route("/notifications", get(get_user_notifications))
}
