//! Registration and login.

use axum::{extract::State, http::StatusCode, response::IntoResponse};
use serde::Deserialize;
use serde_json::json;

use crate::error::{AppError, Result};
use crate::routes::ApiJson;
use crate::services::auth::{AuthService, Registration};
use crate::state::AppState;

/// Registration request body.
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
    pub number: String,
}

/// Login request body.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Create an account.
pub async fn register(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<RegisterRequest>,
) -> Result<impl IntoResponse> {
    let user = AuthService::new(state.pool())
        .register(&Registration {
            username: &body.username,
            email: &body.email,
            password: &body.password,
            number: &body.number,
        })
        .await?;

    Ok((
        StatusCode::CREATED,
        ApiJson(json!({ "message": "User registered", "user": user })),
    ))
}

/// Exchange email and password for a bearer token.
pub async fn login(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<LoginRequest>,
) -> Result<impl IntoResponse> {
    let user = AuthService::new(state.pool())
        .login(&body.email, &body.password)
        .await?;

    let token = state
        .tokens()
        .issue(user.id)
        .map_err(|e| AppError::Internal(e.to_string()))?;

    tracing::debug!(user_id = %user.id, "Issued bearer token");
    Ok(ApiJson(json!({ "token": token })))
}
