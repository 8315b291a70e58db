use axum::{extract::FromRequestParts, http::request::Parts};
use uuid::Uuid;

use crate::{auth::token::TokenPayload, error::AppError, models::Role};

/// AuthUser Extractor Result
///
/// The resolved identity of a request that already passed the role gate.
/// Handlers use it to stamp authorship on the content they write.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: Uuid,
    pub role: Role,
    pub payload: TokenPayload,
}

/// AuthUser Extractor Implementation
///
/// The gate middleware verifies the token and stores the `TokenPayload` in the request
/// extensions; this extractor only reads it back. A handler mounted outside a gated
/// router therefore rejects with 401 instead of silently running unauthenticated.
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let payload = parts
            .extensions
            .get::<TokenPayload>()
            .cloned()
            .ok_or(AppError::Unauthorized)?;

        Ok(AuthUser {
            id: payload.subject,
            role: payload.role,
            payload,
        })
    }
}
