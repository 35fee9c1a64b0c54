//! HTTP route handlers.
//!
//! # Route Structure
//!
//! ```text
//! GET    /health                            - Liveness check
//! GET    /health/ready                      - Readiness check (database)
//! GET    /uploads/{name}                    - Uploaded images
//!
//! # Public
//! POST   /public/register                   - Create account (rate limited)
//! POST   /public/login                      - Issue bearer token (rate limited)
//! GET    /public/products                   - List products (?owner_id, ?collection_id)
//! GET    /public/collections                - List an owner's collections (?owner_id)
//! GET    /public/catalogs/{token}           - Shared collection with its products
//! GET    /public/plans                      - Active plans
//!
//! # Protected (Authorization: Bearer <token>)
//! GET    /protected/me                      - Current user
//! PUT    /protected/me                      - Update username/number
//! PUT    /protected/me/password             - Change password
//! GET    /protected/my-plan                 - Plan and usage
//! POST   /protected/upgrade-plan            - Switch plan
//! POST   /protected/collections             - Create collection
//! GET    /protected/collections             - List own collections
//! PUT    /protected/collections/{id}        - Update collection
//! DELETE /protected/collections/{id}        - Delete collection and its products
//! POST   /protected/collections/{id}/share  - Get or mint share token
//! POST   /protected/products                - Create product (multipart)
//! GET    /protected/products                - List own products
//! PUT    /protected/products/{id}           - Update product (multipart)
//! DELETE /protected/products/{id}           - Delete product
//! ```

pub mod account;
pub mod auth;
pub mod catalogs;
pub mod collections;
pub mod plans;
pub mod products;

use std::str::FromStr;

use axum::{
    Router,
    body::Body,
    extract::{DefaultBodyLimit, FromRequest, State},
    http::{Request, StatusCode},
    middleware::{from_fn, from_fn_with_state},
    response::{IntoResponse, Response},
    routing::{get, post, put},
};
use serde::Serialize;
use tower_http::{cors::CorsLayer, services::ServeDir, trace::TraceLayer};

use crate::error::AppError;
use crate::middleware::{rate_limit_middleware, request_id_middleware, require_bearer};
use crate::services::storage::PUBLIC_PREFIX;
use crate::state::AppState;

/// JSON extractor whose rejections render as `AppError` (400 with a JSON body).
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct ApiJson<T>(pub T);

impl<T: Serialize> IntoResponse for ApiJson<T> {
    fn into_response(self) -> Response {
        axum::Json(self.0).into_response()
    }
}

/// Parse a path or query identifier, rejecting anything but a non-negative integer.
pub(crate) fn parse_id<T: FromStr>(raw: &str, field: &str) -> Result<T, AppError> {
    raw.parse()
        .map_err(|_| AppError::BadRequest(format!("Invalid {field}")))
}

/// Create the unauthenticated routes router.
pub fn public_routes(state: &AppState) -> Router<AppState> {
    Router::new()
        .route(
            "/register",
            post(auth::register).layer(from_fn_with_state(
                state.register_limiter(),
                rate_limit_middleware,
            )),
        )
        .route(
            "/login",
            post(auth::login).layer(from_fn_with_state(
                state.login_limiter(),
                rate_limit_middleware,
            )),
        )
        .route("/products", get(products::list_public))
        .route("/collections", get(collections::list_public))
        .route("/catalogs/{token}", get(catalogs::show))
        .route("/plans", get(plans::list))
}

/// Create the bearer-protected routes router.
pub fn protected_routes(state: &AppState) -> Router<AppState> {
    Router::new()
        .route("/me", get(account::me).put(account::update_me))
        .route("/me/password", put(account::change_password))
        .route("/my-plan", get(plans::my_plan))
        .route("/upgrade-plan", post(plans::upgrade))
        .route(
            "/collections",
            post(collections::create).get(collections::list_mine),
        )
        .route(
            "/collections/{id}",
            put(collections::update).delete(collections::delete),
        )
        .route("/collections/{id}/share", post(collections::share))
        .route("/products", post(products::create).get(products::list_mine))
        .route(
            "/products/{id}",
            put(products::update).delete(products::delete),
        )
        .route_layer(from_fn_with_state(state.clone(), require_bearer))
}

/// Build the full application router (without Sentry layers).
pub fn router(state: AppState) -> Router {
    let upload_dir = state.uploads().dir().to_path_buf();
    let max_body = state.config().uploads.max_request_bytes;

    Router::new()
        .route("/health", get(health))
        .route("/health/ready", get(readiness))
        .nest("/public", public_routes(&state))
        .nest("/protected", protected_routes(&state))
        .nest_service(PUBLIC_PREFIX, ServeDir::new(upload_dir))
        .layer(DefaultBodyLimit::max(max_body))
        .layer(CorsLayer::permissive())
        .layer(from_fn(request_id_middleware))
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
                tracing::info_span!(
                    "http_request",
                    method = %request.method(),
                    uri = %request.uri(),
                    request_id = tracing::field::Empty,
                    user_id = tracing::field::Empty,
                )
            }),
        )
        .with_state(state)
}

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running. Does not check dependencies.
async fn health() -> &'static str {
    "ok"
}

/// Readiness health check endpoint.
///
/// Returns 503 Service Unavailable if the database is not reachable.
async fn readiness(State(state): State<AppState>) -> StatusCode {
    match sqlx::query("SELECT 1").fetch_one(state.pool()).await {
        Ok(_) => StatusCode::OK,
        Err(_) => StatusCode::SERVICE_UNAVAILABLE,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
pub(crate) mod tests {
    use std::sync::Arc;

    use axum::http::{Method, header};
    use sqlx::postgres::PgPoolOptions;
    use tower::ServiceExt;
    use vitrine_core::UserId;

    use super::*;
    use crate::config::tests::test_config;
    use crate::middleware::FixedWindowLimiter;

    /// State backed by a pool that never connects; only paths that fail
    /// before touching the database are exercised.
    pub fn test_state() -> AppState {
        let config = test_config();
        let pool = PgPoolOptions::new()
            .connect_lazy("postgres://localhost/vitrine_test")
            .unwrap();
        AppState::with_limiters(
            config,
            pool,
            Arc::new(FixedWindowLimiter::login()),
            Arc::new(FixedWindowLimiter::register()),
        )
    }

    pub fn bearer_for(state: &AppState, user_id: i32) -> String {
        format!("Bearer {}", state.tokens().issue(UserId::new(user_id)).unwrap())
    }

    pub async fn send(
        app: Router,
        method: Method,
        uri: &str,
        auth: Option<&str>,
        body: Option<serde_json::Value>,
    ) -> (StatusCode, serde_json::Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(auth) = auth {
            builder = builder.header(header::AUTHORIZATION, auth);
        }
        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json = serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null);
        (status, json)
    }

    #[tokio::test]
    async fn test_health() {
        let response = router(test_state())
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_protected_requires_bearer() {
        let app = router(test_state());
        let (status, body) = send(app, Method::GET, "/protected/collections", None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"], "Unauthorized");
    }

    #[tokio::test]
    async fn test_protected_rejects_malformed_and_invalid_tokens() {
        let state = test_state();
        for auth in ["Token abc", "Bearer", "Bearer a b", "Bearer not-a-jwt"] {
            let (status, _) = send(
                router(state.clone()),
                Method::GET,
                "/protected/products",
                Some(auth),
                None,
            )
            .await;
            assert_eq!(status, StatusCode::UNAUTHORIZED, "accepted {auth}");
        }
    }

    #[tokio::test]
    async fn test_unknown_protected_route_is_not_found() {
        let (status, _) = send(router(test_state()), Method::GET, "/protected/nope", None, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_response_carries_request_id() {
        let response = router(test_state())
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert!(response.headers().contains_key("x-request-id"));
    }

    #[test]
    fn test_parse_id() {
        assert_eq!(parse_id::<UserId>("12", "id").unwrap(), UserId::new(12));
        assert!(matches!(
            parse_id::<UserId>("-1", "owner_id"),
            Err(AppError::BadRequest(msg)) if msg == "Invalid owner_id"
        ));
    }
}
