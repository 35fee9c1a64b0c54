//! Plan listing, usage, and plan changes.

use axum::{extract::State, response::IntoResponse};
use serde::Deserialize;
use serde_json::json;

use vitrine_core::PlanId;

use crate::db::{PlanRepository, RepositoryError, UserRepository};
use crate::error::{AppError, Result};
use crate::middleware::RequireAuth;
use crate::routes::ApiJson;
use crate::services::quota::QuotaService;
use crate::state::AppState;

/// Plan change body.
#[derive(Debug, Deserialize)]
pub struct UpgradeRequest {
    pub plan_id: PlanId,
}

/// List active plans, cheapest first.
pub async fn list(State(state): State<AppState>) -> Result<impl IntoResponse> {
    let plans = PlanRepository::new(state.pool()).list_active().await?;
    Ok(ApiJson(plans))
}

/// The caller's plan together with current usage.
pub async fn my_plan(
    State(state): State<AppState>,
    RequireAuth(auth): RequireAuth,
) -> Result<impl IntoResponse> {
    let info = QuotaService::new(state.pool())
        .plan_info(auth.user_id)
        .await?;
    Ok(ApiJson(info))
}

/// Move the caller to another active plan.
///
/// Existing resources above the new plan's ceilings are kept; only further
/// creation is blocked.
pub async fn upgrade(
    State(state): State<AppState>,
    RequireAuth(auth): RequireAuth,
    ApiJson(body): ApiJson<UpgradeRequest>,
) -> Result<impl IntoResponse> {
    let plan = PlanRepository::new(state.pool())
        .get_by_id(body.plan_id)
        .await?
        .filter(|plan| plan.is_active)
        .ok_or_else(|| AppError::BadRequest("Invalid plan".to_string()))?;

    UserRepository::new(state.pool())
        .set_plan(auth.user_id, plan.id)
        .await
        .map_err(|e| match e {
            RepositoryError::NotFound => AppError::NotFound("User".to_string()),
            other => other.into(),
        })?;

    tracing::info!(user_id = %auth.user_id, plan = %plan.name, "Plan changed");
    Ok(ApiJson(json!({
        "message": format!("Plan changed to {}", plan.display_name),
        "plan": plan,
    })))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::http::{Method, StatusCode};
    use serde_json::json;

    use crate::routes::router;
    use crate::routes::tests::{bearer_for, send, test_state};

    #[tokio::test]
    async fn test_my_plan_requires_bearer() {
        let (status, _) = send(router(test_state()), Method::GET, "/protected/my-plan", None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_upgrade_rejects_malformed_plan_id() {
        let state = test_state();
        let auth = bearer_for(&state, 1);
        for body in [json!({}), json!({ "plan_id": "pro" })] {
            let (status, _) = send(
                router(state.clone()),
                Method::POST,
                "/protected/upgrade-plan",
                Some(&auth),
                Some(body.clone()),
            )
            .await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "accepted {body}");
        }
    }
}
