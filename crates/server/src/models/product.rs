//! Product domain types.

use chrono::{DateTime, Utc};
use serde::Serialize;

use vitrine_core::{CollectionId, Price, ProductId, ProductImageId, UserId};

/// A product listed by its owner, optionally inside one collection.
#[derive(Debug, Clone, Serialize)]
pub struct Product {
    pub id: ProductId,
    pub owner_id: UserId,
    pub collection_id: Option<CollectionId>,
    pub name: String,
    pub description: String,
    pub price: Price,
    /// Mirrors the URL of the lowest-position image.
    pub image_url: Option<String>,
    pub images: Vec<ProductImage>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// An image attached to a product.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct ProductImage {
    pub id: ProductImageId,
    pub product_id: ProductId,
    pub image_url: String,
    pub position: i32,
    pub created_at: DateTime<Utc>,
}
