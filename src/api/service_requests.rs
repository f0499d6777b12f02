use axum::{
    routing::{get, patch, post},
    Router,
};

use crate::app_state::AppState;
use crate::db::queries::service_requests::*;

pub fn service_request_routes() -> Router<AppState> {
    Router::new()
        .route("/service-requests", post(create_service_request))
        .route("/service-requests/summary", get(get_request_summary))
        .route("/service-requests/user/{user_id}", get(get_requests_for_user))
        .route(
            "/service-requests/professional/{professional_id}",
            get(get_requests_for_professional),
        )
        .route("/service-requests/{request_id}", get(get_service_request))
        .route(
            "/service-requests/{request_id}/actions",
            get(get_available_actions),
        )
        .route(
            "/service-requests/{request_id}/status",
            patch(update_service_request_status),
        )
        .route(
            "/service-requests/{request_id}/messages",
            post(add_service_request_message),
        )
        .route(
            "/service-requests/{request_id}/messages/read",
            post(mark_messages_read),
        )
        .route(
            "/service-requests/{request_id}/tracker",
            get(get_status_tracker),
        )
        .route("/service-requests/{request_id}/review", post(submit_review))
        .route(
            "/professionals/{professional_id}/reviews",
            get(get_professional_reviews),
        )
}
