//! Bearer token gate and the extractor protected handlers use.

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header::AUTHORIZATION, request::Parts},
    middleware::Next,
    response::Response,
};

use vitrine_core::UserId;

use crate::error::{AppError, set_sentry_user};
use crate::state::AppState;

/// Identity of the caller, inserted into request extensions by [`require_bearer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthUser {
    pub user_id: UserId,
}

/// Middleware that verifies the `Authorization: Bearer <token>` header.
///
/// Does not touch the database; a valid token for a deleted user still
/// passes here and fails later with not-found.
///
/// # Errors
///
/// Returns `AppError::Unauthorized` if the header is missing, malformed, or
/// carries an invalid, expired, or subject-less token.
pub async fn require_bearer(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(bearer_token)
        .ok_or_else(|| AppError::Unauthorized("missing or malformed bearer token".to_string()))?;

    let user_id = state
        .tokens()
        .verify(token)
        .map_err(|e| AppError::Unauthorized(e.to_string()))?;

    set_sentry_user(&user_id);
    tracing::Span::current().record("user_id", tracing::field::display(user_id));

    request.extensions_mut().insert(AuthUser { user_id });
    Ok(next.run(request).await)
}

/// Split `Bearer <token>` into its token. Anything else is rejected.
fn bearer_token(header: &str) -> Option<&str> {
    let mut parts = header.split(' ');
    match (parts.next(), parts.next(), parts.next()) {
        (Some("Bearer"), Some(token), None) if !token.is_empty() => Some(token),
        _ => None,
    }
}

/// Extractor for the authenticated caller.
///
/// Only valid on routes behind [`require_bearer`].
///
/// # Example
///
/// ```rust,ignore
/// async fn handler(RequireAuth(user): RequireAuth) -> String {
///     format!("Hello, user {}!", user.user_id)
/// }
/// ```
pub struct RequireAuth(pub AuthUser);

impl<S> FromRequestParts<S> for RequireAuth
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthUser>()
            .copied()
            .map(Self)
            .ok_or_else(|| AppError::Unauthorized("authentication required".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bearer_token_valid() {
        assert_eq!(bearer_token("Bearer abc.def.ghi"), Some("abc.def.ghi"));
    }

    #[test]
    fn test_bearer_token_rejects_malformed() {
        assert_eq!(bearer_token(""), None);
        assert_eq!(bearer_token("Bearer"), None);
        assert_eq!(bearer_token("Bearer "), None);
        assert_eq!(bearer_token("bearer abc"), None);
        assert_eq!(bearer_token("Basic abc"), None);
        assert_eq!(bearer_token("Bearer abc extra"), None);
        assert_eq!(bearer_token("Bearer  abc"), None);
        assert_eq!(bearer_token("abc"), None);
    }
}
