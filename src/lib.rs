pub mod api;
pub mod app_state;
pub mod config;
pub mod db;
pub mod middleware;
pub mod services;
pub mod utils;

use axum::middleware::from_fn_with_state;
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

pub use crate::app_state::AppState;
use crate::db::queries::notification::NotificationDoc;
use crate::db::queries::service_requests::ServiceRequestDoc;
use crate::middleware::auth::jwt_middleware;

/// Full HTTP application: public health checks, token-protected API, and docs.
pub fn app(state: AppState) -> Router {
    let merged_doc = ServiceRequestDoc::openapi().merge_from(NotificationDoc::openapi());

    let private_routes = Router::new()
        .merge(api::service_requests::service_request_routes())
        .merge(api::notification::notification_routes())
        .route_layer(from_fn_with_state(state.clone(), jwt_middleware));

    Router::new()
        .merge(api::health::health_routes())
        .merge(private_routes)
        .merge(SwaggerUi::new("/swagger").url("/api-docs/openapi.json", merged_doc))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
