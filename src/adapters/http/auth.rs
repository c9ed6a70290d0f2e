//! Authenticated user extraction.
//!
//! Bearer-token extraction in development style: the token is the opaque
//! user id the upstream identity layer minted. The full login flow is an
//! external concern.

use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;

use crate::domain::foundation::UserId;

use super::error::{ApiResponse, ErrorBody};

/// Authenticated user context extracted from the request.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub user_id: UserId,
}

/// Rejection type for [`AuthenticatedUser`] extraction.
pub struct AuthenticationRequired;

impl IntoResponse for AuthenticationRequired {
    fn into_response(self) -> Response {
        let body = ApiResponse::err(ErrorBody::new(
            "UNAUTHORIZED",
            "Authentication is required",
        ));
        (StatusCode::UNAUTHORIZED, Json(body)).into_response()
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
{
    type Rejection = AuthenticationRequired;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let header_value = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .ok_or(AuthenticationRequired)?;
        let token = header_value
            .strip_prefix("Bearer ")
            .ok_or(AuthenticationRequired)?;
        let user_id = UserId::new(token.trim()).map_err(|_| AuthenticationRequired)?;
        Ok(AuthenticatedUser { user_id })
    }
}
