//! Collection route handlers.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::Deserialize;
use serde_json::json;

use vitrine_core::{CollectionId, ResourceKind, UserId};

use crate::db::{CollectionRepository, RepositoryError};
use crate::error::{AppError, Result};
use crate::middleware::RequireAuth;
use crate::models::PublicCollection;
use crate::routes::{ApiJson, parse_id};
use crate::services::quota::QuotaService;
use crate::services::share::ShareService;
use crate::state::AppState;

/// Collection creation body.
#[derive(Debug, Deserialize)]
pub struct CreateCollectionRequest {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

/// Collection update body. Absent fields are left unchanged.
#[derive(Debug, Deserialize)]
pub struct UpdateCollectionRequest {
    pub name: Option<String>,
    pub description: Option<String>,
}

/// Query for the public per-owner listing.
#[derive(Debug, Deserialize)]
pub struct OwnerQuery {
    pub owner_id: Option<String>,
}

fn required_name(raw: &str) -> Result<&str> {
    let name = raw.trim();
    if name.is_empty() {
        return Err(AppError::BadRequest("name is required".to_string()));
    }
    Ok(name)
}

fn not_found(err: RepositoryError) -> AppError {
    match err {
        RepositoryError::NotFound => AppError::NotFound("Collection".to_string()),
        other => other.into(),
    }
}

/// Create a collection, subject to the caller's plan.
pub async fn create(
    State(state): State<AppState>,
    RequireAuth(auth): RequireAuth,
    ApiJson(body): ApiJson<CreateCollectionRequest>,
) -> Result<impl IntoResponse> {
    let name = required_name(&body.name)?;

    let check = QuotaService::new(state.pool())
        .check_limit(auth.user_id, ResourceKind::Collection)
        .await?;
    if !check.allowed {
        return Err(AppError::quota_exceeded(check));
    }

    let collection = CollectionRepository::new(state.pool())
        .create(
            auth.user_id,
            name,
            body.description.as_deref().unwrap_or_default(),
        )
        .await?;

    tracing::info!(collection_id = %collection.id, "Collection created");
    Ok((StatusCode::CREATED, ApiJson(collection)))
}

/// List the caller's collections, share tokens included.
pub async fn list_mine(
    State(state): State<AppState>,
    RequireAuth(auth): RequireAuth,
) -> Result<impl IntoResponse> {
    let collections = CollectionRepository::new(state.pool())
        .list_by_owner(auth.user_id)
        .await?;
    Ok(ApiJson(collections))
}

/// List any owner's collections without authentication.
pub async fn list_public(
    State(state): State<AppState>,
    Query(query): Query<OwnerQuery>,
) -> Result<impl IntoResponse> {
    let raw = query
        .owner_id
        .ok_or_else(|| AppError::BadRequest("owner_id is required".to_string()))?;
    let owner_id: UserId = parse_id(&raw, "owner_id")?;

    let collections: Vec<PublicCollection> = CollectionRepository::new(state.pool())
        .list_by_owner(owner_id)
        .await?
        .into_iter()
        .map(PublicCollection::from)
        .collect();
    Ok(ApiJson(collections))
}

/// Rename or re-describe one of the caller's collections.
pub async fn update(
    State(state): State<AppState>,
    RequireAuth(auth): RequireAuth,
    Path(id): Path<String>,
    ApiJson(body): ApiJson<UpdateCollectionRequest>,
) -> Result<impl IntoResponse> {
    let id: CollectionId = parse_id(&id, "id")?;

    if body.name.is_none() && body.description.is_none() {
        return Err(AppError::BadRequest("No fields to update".to_string()));
    }
    let name = body.name.as_deref().map(required_name).transpose()?;

    let collection = CollectionRepository::new(state.pool())
        .update(id, auth.user_id, name, body.description.as_deref())
        .await
        .map_err(not_found)?;
    Ok(ApiJson(collection))
}

/// Delete one of the caller's collections together with its products.
pub async fn delete(
    State(state): State<AppState>,
    RequireAuth(auth): RequireAuth,
    Path(id): Path<String>,
) -> Result<StatusCode> {
    let id: CollectionId = parse_id(&id, "id")?;

    let orphaned = CollectionRepository::new(state.pool())
        .delete_with_products(id, auth.user_id)
        .await
        .map_err(not_found)?;

    state.uploads().remove_all(&orphaned).await;

    tracing::info!(collection_id = %id, removed_images = orphaned.len(), "Collection deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// Return the collection's share token, minting it on first use.
pub async fn share(
    State(state): State<AppState>,
    RequireAuth(auth): RequireAuth,
    Path(id): Path<String>,
) -> Result<impl IntoResponse> {
    let id: CollectionId = parse_id(&id, "id")?;

    let token = ShareService::new(state.pool())
        .share(id, auth.user_id)
        .await
        .map_err(not_found)?;
    Ok(ApiJson(json!({ "share_token": token })))
}
