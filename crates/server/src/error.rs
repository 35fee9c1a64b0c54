//! Unified error handling with Sentry integration.
//!
//! Provides a unified `AppError` type that captures server errors to Sentry
//! before responding to the client. All route handlers return
//! `Result<T, AppError>`, and every error renders as a JSON body with an
//! `error` field.

use axum::{
    Json,
    extract::multipart::MultipartError,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use vitrine_core::{PlanLimit, ResourceKind};

use crate::db::RepositoryError;
use crate::services::auth::AuthError;
use crate::services::quota::QuotaCheck;
use crate::services::storage::StorageError;

/// Application-level error type.
#[derive(Debug, Error)]
pub enum AppError {
    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(#[from] RepositoryError),

    /// Account operation failed.
    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),

    /// Upload handling failed.
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// The caller's plan does not allow another resource of this kind.
    #[error("{kind} limit reached for plan {plan_name}")]
    QuotaExceeded {
        kind: ResourceKind,
        limit: PlanLimit,
        current_count: i64,
        plan_name: String,
    },

    /// Resource not found (or not owned by the caller).
    #[error("Not found: {0}")]
    NotFound(String),

    /// Caller is not authenticated.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Request body exceeded the upload ceiling.
    #[error("Payload too large")]
    PayloadTooLarge,

    /// Rate limited.
    #[error("Rate limited")]
    RateLimited,

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Build the denial for a failed quota check.
    #[must_use]
    pub fn quota_exceeded(check: QuotaCheck) -> Self {
        Self::QuotaExceeded {
            kind: check.kind,
            limit: check.plan.limit_for(check.kind),
            current_count: check.current_count,
            plan_name: check.plan.display_name,
        }
    }

    fn status(&self) -> StatusCode {
        match self {
            Self::Database(err) => match err {
                RepositoryError::NotFound => StatusCode::NOT_FOUND,
                RepositoryError::Conflict(_) => StatusCode::BAD_REQUEST,
                RepositoryError::Database(_) | RepositoryError::DataCorruption(_) => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
            Self::Auth(err) => match err {
                AuthError::InvalidCredentials => StatusCode::UNAUTHORIZED,
                AuthError::UserNotFound => StatusCode::NOT_FOUND,
                AuthError::InvalidEmail(_)
                | AuthError::InvalidUsername(_)
                | AuthError::InvalidNumber(_)
                | AuthError::WeakPassword(_)
                | AuthError::UsernameTaken
                | AuthError::EmailTaken
                | AuthError::NumberTaken
                | AuthError::NothingToUpdate => StatusCode::BAD_REQUEST,
                AuthError::Repository(_) | AuthError::PasswordHash => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
            Self::Storage(StorageError::UnsupportedType(_) | StorageError::ContentMismatch(_))
            | Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Storage(StorageError::Io(_)) | Self::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            Self::QuotaExceeded { .. } => StatusCode::FORBIDDEN,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            Self::RateLimited => StatusCode::TOO_MANY_REQUESTS,
        }
    }

    // Never expose internal error details to clients
    fn client_message(&self) -> String {
        match self {
            Self::Database(RepositoryError::NotFound) => "Not found".to_string(),
            Self::Database(RepositoryError::Conflict(_)) => "Resource already exists".to_string(),
            Self::Auth(err) => match err {
                AuthError::InvalidCredentials => "Invalid credentials".to_string(),
                AuthError::UserNotFound => "User not found".to_string(),
                AuthError::InvalidEmail(_) => "Invalid email address".to_string(),
                AuthError::InvalidUsername(e) => format!("Invalid username: {e}"),
                AuthError::InvalidNumber(e) => format!("Invalid phone number: {e}"),
                AuthError::WeakPassword(msg) => msg.clone(),
                AuthError::UsernameTaken => "This username is already in use".to_string(),
                AuthError::EmailTaken => "This email is already in use".to_string(),
                AuthError::NumberTaken => "This phone number is already in use".to_string(),
                AuthError::NothingToUpdate => "No fields to update".to_string(),
                AuthError::Repository(_) | AuthError::PasswordHash => {
                    "Internal server error".to_string()
                }
            },
            Self::Storage(StorageError::UnsupportedType(content_type)) => format!(
                "Unsupported file type '{content_type}'. Allowed: image/jpeg, image/png, image/webp"
            ),
            Self::Storage(StorageError::ContentMismatch(content_type)) => {
                format!("File content is not a valid {content_type} image")
            }
            Self::Database(_) | Self::Storage(StorageError::Io(_)) | Self::Internal(_) => {
                "Internal server error".to_string()
            }
            Self::NotFound(what) => format!("{what} not found"),
            Self::Unauthorized(_) => "Unauthorized".to_string(),
            Self::BadRequest(msg) => msg.clone(),
            Self::PayloadTooLarge => "Upload too large".to_string(),
            Self::RateLimited => "Too many attempts, please try again later".to_string(),
            Self::QuotaExceeded { .. } => self.to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        // Capture server errors to Sentry
        if status.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        } else if let Self::Unauthorized(reason) = &self {
            tracing::debug!(reason = %reason, "Rejected unauthenticated request");
        }

        let body = match &self {
            Self::QuotaExceeded {
                limit,
                current_count,
                plan_name,
                ..
            } => json!({
                "error": self.client_message(),
                "limit": limit,
                "current_count": current_count,
                "plan_name": plan_name,
                "upgrade_required": true,
            }),
            _ => json!({ "error": self.client_message() }),
        };

        (status, Json(body)).into_response()
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        Self::BadRequest(format!("Invalid data: {}", rejection.body_text()))
    }
}

impl From<MultipartError> for AppError {
    fn from(err: MultipartError) -> Self {
        if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
            Self::PayloadTooLarge
        } else {
            Self::BadRequest(format!("Invalid form data: {}", err.body_text()))
        }
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Set the Sentry user context from a user ID.
///
/// Called after bearer verification to associate errors with users.
pub fn set_sentry_user(user_id: &impl ToString) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(user_id.to_string()),
            ..Default::default()
        }));
    });
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Utc;
    use vitrine_core::{PlanId, Price};

    use crate::models::Plan;

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn free_plan() -> Plan {
        Plan {
            id: PlanId::new(1),
            name: "free".to_string(),
            display_name: "Free".to_string(),
            description: String::new(),
            price: Price::ZERO,
            max_products: PlanLimit::Limited(10),
            max_collections: PlanLimit::Limited(2),
            features: vec![],
            is_active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_app_error_display() {
        let err = AppError::NotFound("Product".to_string());
        assert_eq!(err.to_string(), "Not found: Product");

        let err = AppError::BadRequest("invalid input".to_string());
        assert_eq!(err.to_string(), "Bad request: invalid input");
    }

    #[test]
    fn test_app_error_status_codes() {
        fn get_status(err: AppError) -> StatusCode {
            err.into_response().status()
        }

        assert_eq!(
            get_status(AppError::NotFound("test".to_string())),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            get_status(AppError::Unauthorized("test".to_string())),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            get_status(AppError::BadRequest("test".to_string())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            get_status(AppError::RateLimited),
            StatusCode::TOO_MANY_REQUESTS
        );
        assert_eq!(
            get_status(AppError::Internal("test".to_string())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            get_status(AppError::Database(RepositoryError::NotFound)),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            get_status(AppError::Auth(AuthError::EmailTaken)),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            get_status(AppError::Auth(AuthError::InvalidCredentials)),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            get_status(AppError::Storage(StorageError::UnsupportedType(
                "image/gif".to_string()
            ))),
            StatusCode::BAD_REQUEST
        );
    }

    #[tokio::test]
    async fn test_internal_errors_hide_details() {
        let err = AppError::Database(RepositoryError::DataCorruption(
            "secret table detail".to_string(),
        ));
        let body = body_json(err.into_response()).await;
        assert_eq!(body["error"], "Internal server error");
    }

    #[tokio::test]
    async fn test_quota_exceeded_payload() {
        let check = QuotaCheck {
            allowed: false,
            plan: free_plan(),
            current_count: 2,
            kind: ResourceKind::Collection,
        };
        let response = AppError::quota_exceeded(check).into_response();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);

        let body = body_json(response).await;
        assert_eq!(body["limit"], 2);
        assert_eq!(body["current_count"], 2);
        assert_eq!(body["plan_name"], "Free");
        assert_eq!(body["upgrade_required"], true);
        assert_eq!(body["error"], "collection limit reached for plan Free");
    }
}
