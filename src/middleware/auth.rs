use crate::{error::AppError, utils::jwt::decode_jwt};
use axum::{extract::Request, http::HeaderMap, middleware::Next, response::Response};

/// Extracted user information from JWT token
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: i32,
}

/// JWT authentication middleware
///
/// Verifies the JWT token from the Authorization header and adds
/// user info to request extensions. Rejects requests without a valid token.
pub async fn auth_middleware(
    headers: HeaderMap,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = extract_bearer_token(&headers).ok_or(AppError::Unauthorized)?;

    let claims = decode_jwt(&token).map_err(|_| AppError::Unauthorized)?;

    let user_id: i32 = claims
        .sub
        .parse()
        .map_err(|_| AppError::Validation("Invalid user ID in token".to_string()))?;

    request.extensions_mut().insert(AuthUser { user_id });

    Ok(next.run(request).await)
}

/// Optional-auth variant for endpoints that personalize their response when
/// a caller is logged in but stay public otherwise (article/course detail,
/// donations). An invalid token is treated the same as no token.
pub async fn optional_auth_middleware(
    headers: HeaderMap,
    mut request: Request,
    next: Next,
) -> Response {
    if let Some(token) = extract_bearer_token(&headers) {
        if let Ok(claims) = decode_jwt(&token) {
            if let Ok(user_id) = claims.sub.parse::<i32>() {
                request.extensions_mut().insert(AuthUser { user_id });
            }
        }
    }

    next.run(request).await
}

fn extract_bearer_token(headers: &HeaderMap) -> Option<String> {
    let auth_header = headers
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())?;

    let token = auth_header.strip_prefix("Bearer ")?;
    if token.is_empty() {
        None
    } else {
        Some(token.to_string())
    }
}

/// The one ownership rule: a mutating operation on an owned resource succeeds
/// only when the acting user is the owner. Applied before every article,
/// comment, and course update/delete.
pub fn ensure_owner(acting_user_id: i32, owner_id: i32) -> Result<(), AppError> {
    if acting_user_id == owner_id {
        Ok(())
    } else {
        Err(AppError::Forbidden)
    }
}

use axum::extract::FromRequestParts;

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut axum::http::request::Parts,
        _state: &S,
    ) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthUser>()
            .cloned()
            .ok_or(AppError::Unauthorized)
    }
}

/// Extractor that yields `Some(AuthUser)` behind the optional-auth layer and
/// `None` for anonymous callers; never rejects.
#[derive(Debug, Clone)]
pub struct MaybeAuthUser(pub Option<AuthUser>);

impl<S> FromRequestParts<S> for MaybeAuthUser
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(
        parts: &mut axum::http::request::Parts,
        _state: &S,
    ) -> Result<Self, Self::Rejection> {
        Ok(MaybeAuthUser(parts.extensions.get::<AuthUser>().cloned()))
    }
}
