//! Authenticated identity extractor.
//!
//! Authentication itself happens upstream (gateway middleware); by the time
//! a request reaches these handlers the verified identity travels in the
//! `x-user-id` header. This extractor is the interface to that collaborator:
//! handlers take `AuthUser` and never look at the header themselves.

use async_trait::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use uuid::Uuid;

use crate::ApiError;

/// Header carrying the verified user identity.
pub const USER_ID_HEADER: &str = "x-user-id";

/// The verified identity of the calling user.
#[derive(Debug, Clone, Copy)]
pub struct AuthUser(pub Uuid);

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .headers
            .get(USER_ID_HEADER)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.parse::<Uuid>().ok())
            .map(AuthUser)
            .ok_or_else(|| ApiError::Unauthorized("Missing or invalid identity".to_string()))
    }
}
