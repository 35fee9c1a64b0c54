//! Account route handlers for the authenticated user.

use axum::{extract::State, response::IntoResponse};
use serde::Deserialize;
use serde_json::json;

use crate::error::Result;
use crate::middleware::RequireAuth;
use crate::routes::ApiJson;
use crate::services::auth::AuthService;
use crate::state::AppState;

/// Profile update body. Absent fields are left unchanged.
#[derive(Debug, Deserialize)]
pub struct UpdateProfileRequest {
    pub username: Option<String>,
    pub number: Option<String>,
}

/// Password change body.
#[derive(Debug, Deserialize)]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

/// Return the caller's account.
pub async fn me(
    State(state): State<AppState>,
    RequireAuth(auth): RequireAuth,
) -> Result<impl IntoResponse> {
    let user = AuthService::new(state.pool()).get_user(auth.user_id).await?;
    Ok(ApiJson(user))
}

/// Change the caller's username and/or phone number.
pub async fn update_me(
    State(state): State<AppState>,
    RequireAuth(auth): RequireAuth,
    ApiJson(body): ApiJson<UpdateProfileRequest>,
) -> Result<impl IntoResponse> {
    let user = AuthService::new(state.pool())
        .update_profile(
            auth.user_id,
            body.username.as_deref(),
            body.number.as_deref(),
        )
        .await?;
    Ok(ApiJson(user))
}

/// Change the caller's password.
pub async fn change_password(
    State(state): State<AppState>,
    RequireAuth(auth): RequireAuth,
    ApiJson(body): ApiJson<ChangePasswordRequest>,
) -> Result<impl IntoResponse> {
    AuthService::new(state.pool())
        .change_password(auth.user_id, &body.current_password, &body.new_password)
        .await?;
    Ok(ApiJson(json!({ "message": "Password updated" })))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::http::{Method, StatusCode};
    use serde_json::json;

    use crate::routes::router;
    use crate::routes::tests::{bearer_for, send, test_state};

    #[tokio::test]
    async fn test_empty_profile_update_is_rejected() {
        let state = test_state();
        let auth = bearer_for(&state, 1);
        let (status, body) = send(
            router(state),
            Method::PUT,
            "/protected/me",
            Some(&auth),
            Some(json!({})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "No fields to update");
    }

    #[tokio::test]
    async fn test_invalid_profile_fields_are_rejected() {
        let state = test_state();
        let auth = bearer_for(&state, 1);
        for body in [json!({ "username": "!" }), json!({ "number": "12" })] {
            let (status, _) = send(
                router(state.clone()),
                Method::PUT,
                "/protected/me",
                Some(&auth),
                Some(body),
            )
            .await;
            assert_eq!(status, StatusCode::BAD_REQUEST);
        }
    }

    #[tokio::test]
    async fn test_short_new_password_is_rejected() {
        let state = test_state();
        let auth = bearer_for(&state, 1);
        let (status, _) = send(
            router(state),
            Method::PUT,
            "/protected/me/password",
            Some(&auth),
            Some(json!({ "current_password": "pass123456", "new_password": "abc" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}
