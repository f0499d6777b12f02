use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::services::error::ServiceRequestError;

/// Envelope every API endpoint answers with.
#[derive(Serialize, Deserialize, Debug)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub status_code: u16,
    pub message: String,
    /// RFC 3339, set when the envelope is built.
    pub timestamp: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<Value>,
}

impl<T> ApiResponse<T> {
    fn envelope(status: StatusCode, message: String, data: Option<T>, errors: Option<Value>) -> Self {
        Self {
            success: status.is_success(),
            status_code: status.as_u16(),
            message,
            timestamp: Utc::now().to_rfc3339(),
            data,
            errors,
        }
    }

    /// ✅ Success envelope carrying `data`
    pub fn success(status: StatusCode, message: impl Into<String>, data: T) -> Self {
        Self::envelope(status, message.into(), Some(data), None)
    }

    /// ❌ Error envelope, optionally with structured details
    pub fn error(status: StatusCode, message: impl Into<String>, errors: Option<Value>) -> Self {
        Self::envelope(status, message.into(), None, errors)
    }

    pub fn status(&self) -> StatusCode {
        StatusCode::from_u16(self.status_code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        (self.status(), Json(self)).into_response()
    }
}

impl From<ServiceRequestError> for ApiResponse<()> {
    fn from(err: ServiceRequestError) -> Self {
        match &err {
            ServiceRequestError::Validation(_) => {
                ApiResponse::error(StatusCode::BAD_REQUEST, err.to_string(), None)
            }
            ServiceRequestError::NotFound(id) => ApiResponse::error(
                StatusCode::NOT_FOUND,
                err.to_string(),
                Some(json!({ "request_id": id })),
            ),
            ServiceRequestError::InvalidTransition { from, to, role } => ApiResponse::error(
                StatusCode::CONFLICT,
                err.to_string(),
                Some(json!({ "from": from, "to": to, "role": role })),
            ),
            ServiceRequestError::NotReviewable(_) => {
                ApiResponse::error(StatusCode::CONFLICT, err.to_string(), None)
            }
            ServiceRequestError::Forbidden(_) => {
                ApiResponse::error(StatusCode::FORBIDDEN, err.to_string(), None)
            }
        }
    }
}

/// Malformed or mistyped request bodies answer with the envelope instead of
/// axum's plain-text rejection.
impl From<JsonRejection> for ApiResponse<()> {
    fn from(rejection: JsonRejection) -> Self {
        let status = match rejection {
            JsonRejection::MissingJsonContentType(_) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            _ => StatusCode::BAD_REQUEST,
        };
        ApiResponse::error(
            status,
            "Invalid request body",
            Some(json!({ "error": rejection.body_text() })),
        )
    }
}
