use axum::http::StatusCode;
use jsonwebtoken::{encode, EncodingKey, Header};
use serde::{Deserialize, Serialize};
use utoipa::openapi::security::{Http, HttpAuthScheme, SecurityScheme};
use utoipa::openapi::Components;
use utoipa::Modify;

use crate::db::models::service_request::{Actor, ActorRole};
use crate::utils::api_response::ApiResponse;

/// JWT Claims issued by the identity provider.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Subject - User ID as String
    pub sub: String,
    /// The username of the authenticated user.
    pub username: String,
    /// `client` (or `user`) / `professional`
    pub role: String,
    /// Expiration timestamp (UNIX TIME)
    pub exp: usize,
}

impl Claims {
    pub fn new(sub: impl Into<String>, username: impl Into<String>, role: impl Into<String>, exp: usize) -> Self {
        Self {
            sub: sub.into(),
            username: username.into(),
            role: role.into(),
            exp,
        }
    }

    /// Converts the token into the acting user, or returns a descriptive error.
    pub fn actor(&self) -> Result<Actor, ApiResponse<()>> {
        let role = self.role.parse::<ActorRole>().map_err(|e| {
            ApiResponse::error(StatusCode::FORBIDDEN, e.to_string(), None)
        })?;
        if self.sub.trim().is_empty() {
            return Err(ApiResponse::error(
                StatusCode::BAD_REQUEST,
                "Invalid user ID in token",
                None,
            ));
        }
        Ok(Actor::new(self.sub.clone(), role))
    }

    /// Signs the claims with HS256. Tokens are normally minted by the identity provider.
    pub fn sign(&self, secret: &str) -> Result<String, jsonwebtoken::errors::Error> {
        encode(&Header::default(), self, &EncodingKey::from_secret(secret.as_bytes()))
    }
}

pub struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let mut components = openapi.components.clone().unwrap_or(Components::default());

        components.add_security_scheme(
            "bearerAuth",
            SecurityScheme::Http(Http::new(HttpAuthScheme::Bearer)),
        );

        openapi.components = Some(components);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn actor_from_claims() {
        let actor = Claims::new("pro-1", "pat", "professional", 0).actor().unwrap();
        assert_eq!(actor, Actor::new("pro-1", ActorRole::Professional));

        let actor = Claims::new("user-1", "sam", "user", 0).actor().unwrap();
        assert_eq!(actor.role, ActorRole::Client);
    }

    #[test]
    fn unknown_role_is_forbidden() {
        let err = Claims::new("x", "x", "admin", 0).actor().unwrap_err();
        assert_eq!(err.status_code, 403);
    }
}
