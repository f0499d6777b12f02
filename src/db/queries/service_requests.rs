use axum::{
    extract::{Extension, Path, State},
    http::StatusCode,
    Json,
};
use axum_extra::extract::WithRejection;

use crate::api::auth::{Claims, SecurityAddon};
use crate::app_state::AppState;
use crate::db::models::review::{NewReview, Review};
use crate::db::models::service_request::{
    CreateServiceRequest, NewServiceRequest, NewServiceRequestMessage, ServiceRequest,
    ServiceRequestMessage, ServiceRequestSummary, UpdateServiceRequestStatus,
};
use crate::services::error::ServiceRequestError;
use crate::services::status_policy::{self, StatusAction};
use crate::services::tracker::TrackerView;
use crate::utils::api_response::ApiResponse;

/// JSON body whose rejections are answered with the `ApiResponse` envelope.
type JsonBody<T> = WithRejection<Json<T>, ApiResponse<()>>;

#[utoipa::path(
    post,
    path = "/service-requests",
    request_body = CreateServiceRequest,
    responses(
        (status = 201, description = "Service request created", body = ServiceRequest),
        (status = 400, description = "Missing required fields")
    ),
    tag = "Service Requests",
    security(("bearerAuth" = []))
)]
pub async fn create_service_request(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    WithRejection(Json(payload), _): JsonBody<CreateServiceRequest>,
) -> Result<ApiResponse<ServiceRequest>, ApiResponse<()>> {
    let actor = claims.actor()?;

    let request = state
        .store
        .create(NewServiceRequest {
            user_id: actor.id,
            professional_id: payload.professional_id,
            service_title: payload.service_title,
            description: payload.description,
            budget: payload.budget,
            timeline: payload.timeline,
        })
        .await?;

    Ok(ApiResponse::success(StatusCode::CREATED, "Service request sent", request))
}

#[utoipa::path(
    get,
    path = "/service-requests/{request_id}",
    params(
        ("request_id" = String, Path, description = "Service request ID")
    ),
    responses(
        (status = 200, description = "Service request retrieved", body = ServiceRequest),
        (status = 404, description = "Service request not found")
    ),
    tag = "Service Requests",
    security(("bearerAuth" = []))
)]
pub async fn get_service_request(
    State(state): State<AppState>,
    Path(request_id): Path<String>,
) -> Result<ApiResponse<ServiceRequest>, ApiResponse<()>> {
    let request = state
        .store
        .get_by_id(&request_id)
        .await
        .ok_or(ServiceRequestError::NotFound(request_id))?;

    Ok(ApiResponse::success(StatusCode::OK, "Service request retrieved", request))
}

#[utoipa::path(
    get,
    path = "/service-requests/user/{user_id}",
    params(
        ("user_id" = String, Path, description = "Client user ID")
    ),
    responses(
        (status = 200, description = "Requests submitted by the user", body = Vec<ServiceRequest>)
    ),
    tag = "Service Requests",
    security(("bearerAuth" = []))
)]
pub async fn get_requests_for_user(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> ApiResponse<Vec<ServiceRequest>> {
    let requests = state.store.list_by_user(&user_id).await;
    ApiResponse::success(StatusCode::OK, "Service requests retrieved", requests)
}

#[utoipa::path(
    get,
    path = "/service-requests/professional/{professional_id}",
    params(
        ("professional_id" = String, Path, description = "Professional ID")
    ),
    responses(
        (status = 200, description = "Requests addressed to the professional", body = Vec<ServiceRequest>)
    ),
    tag = "Service Requests",
    security(("bearerAuth" = []))
)]
pub async fn get_requests_for_professional(
    State(state): State<AppState>,
    Path(professional_id): Path<String>,
) -> ApiResponse<Vec<ServiceRequest>> {
    let requests = state.store.list_by_professional(&professional_id).await;
    ApiResponse::success(StatusCode::OK, "Service requests retrieved", requests)
}

#[utoipa::path(
    get,
    path = "/service-requests/summary",
    responses(
        (status = 200, description = "Per-status counts for the current user", body = ServiceRequestSummary)
    ),
    tag = "Service Requests",
    security(("bearerAuth" = []))
)]
pub async fn get_request_summary(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> ApiResponse<ServiceRequestSummary> {
    let summary = state.store.summary_for(&claims.sub).await;
    ApiResponse::success(StatusCode::OK, "Service request summary", summary)
}

#[utoipa::path(
    get,
    path = "/service-requests/{request_id}/actions",
    params(
        ("request_id" = String, Path, description = "Service request ID")
    ),
    responses(
        (status = 200, description = "Status changes available to the current user", body = Vec<StatusAction>),
        (status = 404, description = "Service request not found")
    ),
    tag = "Service Requests",
    security(("bearerAuth" = []))
)]
pub async fn get_available_actions(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(request_id): Path<String>,
) -> Result<ApiResponse<Vec<StatusAction>>, ApiResponse<()>> {
    let actor = claims.actor()?;
    let request = state
        .store
        .get_by_id(&request_id)
        .await
        .ok_or(ServiceRequestError::NotFound(request_id))?;

    let actions = status_policy::available_transitions(request.status, actor.role).to_vec();
    Ok(ApiResponse::success(StatusCode::OK, "Available actions", actions))
}

#[utoipa::path(
    patch,
    path = "/service-requests/{request_id}/status",
    params(
        ("request_id" = String, Path, description = "Service request ID")
    ),
    request_body = UpdateServiceRequestStatus,
    responses(
        (status = 200, description = "Status updated", body = ServiceRequest),
        (status = 400, description = "Malformed body or unknown status"),
        (status = 403, description = "Caller is not a party to the request"),
        (status = 404, description = "Service request not found"),
        (status = 409, description = "Transition not allowed for this role")
    ),
    tag = "Service Requests",
    security(("bearerAuth" = []))
)]
pub async fn update_service_request_status(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(request_id): Path<String>,
    WithRejection(Json(payload), _): JsonBody<UpdateServiceRequestStatus>,
) -> Result<ApiResponse<ServiceRequest>, ApiResponse<()>> {
    let actor = claims.actor()?;
    state.store.get_for_party(&request_id, &actor).await?;
    let request = state
        .store
        .set_status(&request_id, actor.role, payload.status)
        .await?;

    Ok(ApiResponse::success(
        StatusCode::OK,
        request.status.notification_message(),
        request,
    ))
}

#[utoipa::path(
    post,
    path = "/service-requests/{request_id}/messages",
    params(
        ("request_id" = String, Path, description = "Service request ID")
    ),
    request_body = NewServiceRequestMessage,
    responses(
        (status = 201, description = "Message sent", body = ServiceRequestMessage),
        (status = 400, description = "Empty message"),
        (status = 403, description = "Caller is not a party to the request"),
        (status = 404, description = "Service request not found")
    ),
    tag = "Service Requests",
    security(("bearerAuth" = []))
)]
pub async fn add_service_request_message(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(request_id): Path<String>,
    WithRejection(Json(payload), _): JsonBody<NewServiceRequestMessage>,
) -> Result<ApiResponse<ServiceRequestMessage>, ApiResponse<()>> {
    let actor = claims.actor()?;
    state.store.get_for_party(&request_id, &actor).await?;
    let message = state
        .store
        .add_message(&request_id, Some(actor.id.as_str()), &payload.message)
        .await?
        .ok_or_else(|| {
            ApiResponse::<()>::error(StatusCode::BAD_REQUEST, "Invalid user ID in token", None)
        })?;

    Ok(ApiResponse::success(StatusCode::CREATED, "Message sent", message))
}

#[utoipa::path(
    post,
    path = "/service-requests/{request_id}/messages/read",
    params(
        ("request_id" = String, Path, description = "Service request ID")
    ),
    responses(
        (status = 200, description = "Number of messages marked as read", body = usize),
        (status = 403, description = "Caller is not a party to the request"),
        (status = 404, description = "Service request not found")
    ),
    tag = "Service Requests",
    security(("bearerAuth" = []))
)]
pub async fn mark_messages_read(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(request_id): Path<String>,
) -> Result<ApiResponse<usize>, ApiResponse<()>> {
    let actor = claims.actor()?;
    state.store.get_for_party(&request_id, &actor).await?;
    let changed = state.store.mark_messages_read(&request_id, &actor.id).await?;
    Ok(ApiResponse::success(StatusCode::OK, "Messages marked as read", changed))
}

#[utoipa::path(
    get,
    path = "/service-requests/{request_id}/tracker",
    params(
        ("request_id" = String, Path, description = "Service request ID")
    ),
    responses(
        (status = 200, description = "Work status tracker for the current user", body = TrackerView),
        (status = 404, description = "Service request not found")
    ),
    tag = "Service Requests",
    security(("bearerAuth" = []))
)]
pub async fn get_status_tracker(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(request_id): Path<String>,
) -> Result<ApiResponse<TrackerView>, ApiResponse<()>> {
    let actor = claims.actor()?;
    let view = state
        .tracker
        .view(&request_id, actor.is_professional())
        .await?;

    Ok(ApiResponse::success(StatusCode::OK, "Work status tracker", view))
}

#[utoipa::path(
    post,
    path = "/service-requests/{request_id}/review",
    params(
        ("request_id" = String, Path, description = "Service request ID")
    ),
    request_body = NewReview,
    responses(
        (status = 201, description = "Review submitted", body = Review),
        (status = 400, description = "Rating out of range or empty review"),
        (status = 403, description = "Caller is not the requesting client"),
        (status = 404, description = "Service request not found"),
        (status = 409, description = "Request cannot be reviewed")
    ),
    tag = "Service Requests",
    security(("bearerAuth" = []))
)]
pub async fn submit_review(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(request_id): Path<String>,
    WithRejection(Json(payload), _): JsonBody<NewReview>,
) -> Result<ApiResponse<Review>, ApiResponse<()>> {
    let actor = claims.actor()?;
    let review = state
        .tracker
        .submit_review(&request_id, &actor, payload.rating, &payload.comment)
        .await?;

    Ok(ApiResponse::success(
        StatusCode::CREATED,
        "Thank you for your feedback!",
        review,
    ))
}

#[utoipa::path(
    get,
    path = "/professionals/{professional_id}/reviews",
    params(
        ("professional_id" = String, Path, description = "Professional ID")
    ),
    responses(
        (status = 200, description = "Reviews received by the professional", body = Vec<Review>)
    ),
    tag = "Service Requests",
    security(("bearerAuth" = []))
)]
pub async fn get_professional_reviews(
    State(state): State<AppState>,
    Path(professional_id): Path<String>,
) -> ApiResponse<Vec<Review>> {
    let reviews = state.tracker.reviews_for_professional(&professional_id).await;
    ApiResponse::success(StatusCode::OK, "Reviews retrieved", reviews)
}

use utoipa::OpenApi;
#[derive(OpenApi)]
#[openapi(
    paths(
        create_service_request,
        get_service_request,
        get_requests_for_user,
        get_requests_for_professional,
        get_request_summary,
        get_available_actions,
        update_service_request_status,
        add_service_request_message,
        mark_messages_read,
        get_status_tracker,
        submit_review,
        get_professional_reviews
    ),
    components(schemas(
        ServiceRequest, ServiceRequestMessage, CreateServiceRequest,
        UpdateServiceRequestStatus, NewServiceRequestMessage, ServiceRequestSummary,
        StatusAction, TrackerView, Review, NewReview
    )),
    tags(
        (name = "Service Requests", description = "Service request lifecycle, messaging and reviews")
    ),
    modifiers(&SecurityAddon)
)]
pub struct ServiceRequestDoc;
