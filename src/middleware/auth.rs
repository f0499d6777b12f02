use axum::{
    body::Body,
    extract::{Request, State},
    http::{header::AUTHORIZATION, HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use jsonwebtoken::{decode, DecodingKey, Validation};
use serde_json::json;

use crate::api::auth::Claims;
use crate::app_state::AppState;
use crate::utils::api_response::ApiResponse;

fn unauthorized(message: &str) -> ApiResponse<()> {
    ApiResponse::error(StatusCode::UNAUTHORIZED, message, None)
}

/// Pulls the raw token out of `Authorization: Bearer <token>`.
fn bearer_token(headers: &HeaderMap) -> Result<&str, ApiResponse<()>> {
    let value = headers
        .get(AUTHORIZATION)
        .ok_or_else(|| unauthorized("Missing Authorization header"))?
        .to_str()
        .map_err(|_| unauthorized("Invalid Authorization header format"))?;

    value
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| unauthorized("Invalid token format (missing 'Bearer ' prefix)"))
}

/// ✅ **JWT Middleware**
///
/// Verifies the HS256 token against `JWT_SECRET` and makes the [`Claims`]
/// available to handlers as an extension. Role checks happen in the handlers.
pub async fn jwt_middleware(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, Response> {
    let token = bearer_token(req.headers()).map_err(|e| {
        tracing::warn!(reason = %e.message, "rejected request without usable token");
        e.into_response()
    })?;

    let claims = decode::<Claims>(
        token,
        &DecodingKey::from_secret(state.config.jwt_secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|e| {
        tracing::warn!("JWT decoding failed: {:?}", e);
        ApiResponse::<()>::error(
            StatusCode::UNAUTHORIZED,
            "Invalid token",
            Some(json!({ "error": e.to_string() })),
        )
        .into_response()
    })?;

    tracing::debug!(sub = %claims.sub, role = %claims.role, "JWT decoded");
    req.extensions_mut().insert(claims);

    Ok(next.run(req).await)
}
