//! Product route handlers.
//!
//! Create and update take `multipart/form-data` so images can travel with
//! the product fields. Image files are written to disk before the database
//! transaction and removed again if it fails.

use axum::{
    extract::{Multipart, Path, Query, State, multipart::MultipartRejection},
    http::StatusCode,
    response::IntoResponse,
};
use serde::Deserialize;

use vitrine_core::{CollectionId, Price, ProductId, ProductImageId, ResourceKind, UserId};

use crate::db::products::{NewProduct, ProductChanges, ProductFilter};
use crate::db::{CollectionRepository, ProductRepository, RepositoryError};
use crate::error::{AppError, Result};
use crate::middleware::RequireAuth;
use crate::routes::{ApiJson, parse_id};
use crate::services::quota::QuotaService;
use crate::services::storage::PendingUpload;
use crate::state::AppState;

// =============================================================================
// Form Types
// =============================================================================

/// Raw multipart fields, before validation.
#[derive(Debug, Default)]
struct ProductForm {
    name: Option<String>,
    description: Option<String>,
    price: Option<String>,
    collection_id: Option<String>,
    delete_image_ids: Vec<String>,
    images: Vec<PendingUpload>,
    image: Option<PendingUpload>,
}

impl ProductForm {
    async fn read(multipart: std::result::Result<Multipart, MultipartRejection>) -> Result<Self> {
        let mut multipart = multipart
            .map_err(|e| AppError::BadRequest(format!("Invalid form data: {}", e.body_text())))?;
        let mut form = Self::default();

        while let Some(field) = multipart.next_field().await? {
            let field_name = field.name().unwrap_or_default().to_owned();
            match field_name.as_str() {
                "images" | "images[]" | "image" => {
                    let content_type = field.content_type().map(str::to_owned);
                    let bytes = field.bytes().await?;
                    // Browsers send an empty part for an untouched file input.
                    if bytes.is_empty() {
                        continue;
                    }
                    let upload = PendingUpload::new(content_type.as_deref(), bytes.to_vec())?;
                    if field_name == "image" {
                        form.image = Some(upload);
                    } else {
                        form.images.push(upload);
                    }
                }
                "delete_image_ids" | "delete_image_ids[]" => {
                    form.delete_image_ids.push(field.text().await?);
                }
                "name" => form.name = Some(field.text().await?),
                "description" => form.description = Some(field.text().await?),
                "price" => form.price = Some(field.text().await?),
                "collection_id" => form.collection_id = Some(field.text().await?),
                _ => {}
            }
        }

        Ok(form)
    }

    /// Uploads to store. A lone `image` only counts when no `images` were sent.
    fn take_uploads(&mut self) -> Vec<PendingUpload> {
        if self.images.is_empty() {
            self.image.take().into_iter().collect()
        } else {
            std::mem::take(&mut self.images)
        }
    }
}

/// Query filters for product listings.
#[derive(Debug, Deserialize)]
pub struct ProductQuery {
    pub owner_id: Option<String>,
    pub collection_id: Option<String>,
}

fn parse_name(raw: &str) -> Result<&str> {
    let name = raw.trim();
    if name.is_empty() {
        return Err(AppError::BadRequest("name is required".to_string()));
    }
    Ok(name)
}

fn parse_price(raw: &str) -> Result<Price> {
    Price::parse(raw).map_err(|e| AppError::BadRequest(format!("Invalid price: {e}")))
}

/// Blank means "no collection".
fn parse_collection_id(raw: &str) -> Result<Option<CollectionId>> {
    if raw.trim().is_empty() {
        return Ok(None);
    }
    parse_id(raw, "collection_id").map(Some)
}

fn parse_image_ids(raw: &[String]) -> Result<Vec<ProductImageId>> {
    raw.iter()
        .map(|id| parse_id(id, "delete_image_ids"))
        .collect()
}

fn not_found(err: RepositoryError) -> AppError {
    match err {
        RepositoryError::NotFound => AppError::NotFound("Product".to_string()),
        other => other.into(),
    }
}

async fn ensure_collection_owned(
    state: &AppState,
    collection_id: Option<CollectionId>,
    owner_id: UserId,
) -> Result<()> {
    let Some(collection_id) = collection_id else {
        return Ok(());
    };
    CollectionRepository::new(state.pool())
        .get_owned(collection_id, owner_id)
        .await?
        .map(|_| ())
        .ok_or_else(|| AppError::BadRequest("Invalid collection_id".to_string()))
}

// =============================================================================
// Handlers
// =============================================================================

/// Create a product, subject to the caller's plan.
pub async fn create(
    State(state): State<AppState>,
    RequireAuth(auth): RequireAuth,
    multipart: std::result::Result<Multipart, MultipartRejection>,
) -> Result<impl IntoResponse> {
    let mut form = ProductForm::read(multipart).await?;

    let name = parse_name(form.name.as_deref().unwrap_or_default())?.to_owned();
    let price = form
        .price
        .as_deref()
        .ok_or_else(|| AppError::BadRequest("price is required".to_string()))
        .and_then(parse_price)?;
    let collection_id = form
        .collection_id
        .as_deref()
        .map(parse_collection_id)
        .transpose()?
        .flatten();

    let check = QuotaService::new(state.pool())
        .check_limit(auth.user_id, ResourceKind::Product)
        .await?;
    if !check.allowed {
        return Err(AppError::quota_exceeded(check));
    }

    ensure_collection_owned(&state, collection_id, auth.user_id).await?;

    let image_urls = state.uploads().save_all(form.take_uploads()).await?;

    let created = ProductRepository::new(state.pool())
        .create(
            &NewProduct {
                owner_id: auth.user_id,
                collection_id,
                name: &name,
                description: form.description.as_deref().unwrap_or_default(),
                price,
            },
            &image_urls,
        )
        .await;

    let product = match created {
        Ok(product) => product,
        Err(e) => {
            state.uploads().remove_all(&image_urls).await;
            return Err(e.into());
        }
    };

    tracing::info!(product_id = %product.id, images = image_urls.len(), "Product created");
    Ok((StatusCode::CREATED, ApiJson(product)))
}

/// List products, optionally filtered by owner and collection.
pub async fn list_public(
    State(state): State<AppState>,
    Query(query): Query<ProductQuery>,
) -> Result<impl IntoResponse> {
    let filter = ProductFilter {
        owner_id: query
            .owner_id
            .as_deref()
            .filter(|raw| !raw.is_empty())
            .map(|raw| parse_id(raw, "owner_id"))
            .transpose()?,
        collection_id: query
            .collection_id
            .as_deref()
            .filter(|raw| !raw.is_empty())
            .map(|raw| parse_id(raw, "collection_id"))
            .transpose()?,
    };

    let products = ProductRepository::new(state.pool()).list(filter).await?;
    Ok(ApiJson(products))
}

/// List the caller's products.
pub async fn list_mine(
    State(state): State<AppState>,
    RequireAuth(auth): RequireAuth,
) -> Result<impl IntoResponse> {
    let products = ProductRepository::new(state.pool())
        .list(ProductFilter {
            owner_id: Some(auth.user_id),
            collection_id: None,
        })
        .await?;
    Ok(ApiJson(products))
}

/// Partially update one of the caller's products.
pub async fn update(
    State(state): State<AppState>,
    RequireAuth(auth): RequireAuth,
    Path(id): Path<String>,
    multipart: std::result::Result<Multipart, MultipartRejection>,
) -> Result<impl IntoResponse> {
    let id: ProductId = parse_id(&id, "id")?;
    let mut form = ProductForm::read(multipart).await?;
    let uploads = form.take_uploads();

    let name = form.name.as_deref().map(parse_name).transpose()?;
    let price = form.price.as_deref().map(parse_price).transpose()?;
    let collection_id = form
        .collection_id
        .as_deref()
        .map(parse_collection_id)
        .transpose()?;
    let delete_image_ids = parse_image_ids(&form.delete_image_ids)?;

    let nothing_to_do = ProductChanges {
        name,
        description: form.description.as_deref(),
        price,
        collection_id,
        delete_image_ids: &delete_image_ids,
        new_image_urls: &[],
    }
    .is_empty();
    if nothing_to_do && uploads.is_empty() {
        return Err(AppError::BadRequest("No fields to update".to_string()));
    }

    ensure_collection_owned(&state, collection_id.flatten(), auth.user_id).await?;

    let new_image_urls = state.uploads().save_all(uploads).await?;

    let changes = ProductChanges {
        name,
        description: form.description.as_deref(),
        price,
        collection_id,
        delete_image_ids: &delete_image_ids,
        new_image_urls: &new_image_urls,
    };

    let (product, removed) = match ProductRepository::new(state.pool())
        .update(id, auth.user_id, &changes)
        .await
    {
        Ok(updated) => updated,
        Err(e) => {
            state.uploads().remove_all(&new_image_urls).await;
            return Err(not_found(e));
        }
    };

    state.uploads().remove_all(&removed).await;
    Ok(ApiJson(product))
}

/// Delete one of the caller's products and its images.
pub async fn delete(
    State(state): State<AppState>,
    RequireAuth(auth): RequireAuth,
    Path(id): Path<String>,
) -> Result<StatusCode> {
    let id: ProductId = parse_id(&id, "id")?;

    let removed = ProductRepository::new(state.pool())
        .delete(id, auth.user_id)
        .await
        .map_err(not_found)?;

    state.uploads().remove_all(&removed).await;

    tracing::info!(product_id = %id, "Product deleted");
    Ok(StatusCode::NO_CONTENT)
}
