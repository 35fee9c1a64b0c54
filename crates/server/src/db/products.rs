//! Product repository.
//!
//! Products are returned with their images attached. Writes that touch both
//! the product row and its images run in a single transaction.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use vitrine_core::{CollectionId, Price, ProductId, ProductImageId, UserId};

use super::RepositoryError;
use super::images::{self, ProductImageRepository};
use crate::models::Product;

const PRODUCT_COLUMNS: &str = "id, owner_id, collection_id, name, description, price, image_url, created_at, updated_at";

#[derive(sqlx::FromRow)]
struct ProductRow {
    id: ProductId,
    owner_id: UserId,
    collection_id: Option<CollectionId>,
    name: String,
    description: String,
    price: Price,
    image_url: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl ProductRow {
    fn into_product(self, images: Vec<crate::models::ProductImage>) -> Product {
        Product {
            id: self.id,
            owner_id: self.owner_id,
            collection_id: self.collection_id,
            name: self.name,
            description: self.description,
            price: self.price,
            image_url: self.image_url,
            images,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

/// Optional filters for listing products. Absent filters match everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProductFilter {
    pub owner_id: Option<UserId>,
    pub collection_id: Option<CollectionId>,
}

/// Fields for a new product.
pub struct NewProduct<'a> {
    pub owner_id: UserId,
    pub collection_id: Option<CollectionId>,
    pub name: &'a str,
    pub description: &'a str,
    pub price: Price,
}

/// A partial product update. `None` leaves the field unchanged.
#[derive(Debug, Default)]
pub struct ProductChanges<'a> {
    pub name: Option<&'a str>,
    pub description: Option<&'a str>,
    pub price: Option<Price>,
    /// `Some(None)` removes the product from its collection.
    pub collection_id: Option<Option<CollectionId>>,
    pub delete_image_ids: &'a [ProductImageId],
    pub new_image_urls: &'a [String],
}

impl ProductChanges<'_> {
    /// Whether applying these changes would modify anything.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.description.is_none()
            && self.price.is_none()
            && self.collection_id.is_none()
            && self.delete_image_ids.is_empty()
            && self.new_image_urls.is_empty()
    }
}

/// Repository for product database operations.
pub struct ProductRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ProductRepository<'a> {
    /// Create a new product repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Count products owned by a user.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn count_by_owner(&self, owner_id: UserId) -> Result<i64, RepositoryError> {
        let count = sqlx::query_scalar("SELECT COUNT(*) FROM products WHERE owner_id = $1")
            .bind(owner_id)
            .fetch_one(self.pool)
            .await?;

        Ok(count)
    }

    /// List products matching `filter`, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self, filter: ProductFilter) -> Result<Vec<Product>, RepositoryError> {
        let rows: Vec<ProductRow> = sqlx::query_as(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products
             WHERE ($1::INTEGER IS NULL OR owner_id = $1)
               AND ($2::INTEGER IS NULL OR collection_id = $2)
             ORDER BY created_at DESC, id DESC"
        ))
        .bind(filter.owner_id)
        .bind(filter.collection_id)
        .fetch_all(self.pool)
        .await?;

        self.attach_images(rows).await
    }

    /// Get a product if it is owned by `owner_id`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_owned(
        &self,
        id: ProductId,
        owner_id: UserId,
    ) -> Result<Option<Product>, RepositoryError> {
        let row: Option<ProductRow> = sqlx::query_as(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = $1 AND owner_id = $2"
        ))
        .bind(id)
        .bind(owner_id)
        .fetch_optional(self.pool)
        .await?;

        match row {
            Some(row) => Ok(self.attach_images(vec![row]).await?.pop()),
            None => Ok(None),
        }
    }

    /// Insert a product together with its images.
    ///
    /// Images are stored at positions `0..n` in the given order and the
    /// first one becomes the cover.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if any statement fails; nothing is
    /// committed in that case.
    pub async fn create(
        &self,
        product: &NewProduct<'_>,
        image_urls: &[String],
    ) -> Result<Product, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let id: ProductId = sqlx::query_scalar(
            "INSERT INTO products (owner_id, collection_id, name, description, price)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING id",
        )
        .bind(product.owner_id)
        .bind(product.collection_id)
        .bind(product.name)
        .bind(product.description)
        .bind(product.price)
        .fetch_one(&mut *tx)
        .await?;

        images::append(&mut tx, id, image_urls).await?;
        images::refresh_cover(&mut tx, id).await?;

        tx.commit().await?;

        self.get_owned(id, product.owner_id)
            .await?
            .ok_or(RepositoryError::NotFound)
    }

    /// Apply a partial update, including image removals and additions.
    ///
    /// The cover image is recomputed after all image changes. Returns the
    /// updated product and the URLs of removed images.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if no product matches `id` and
    /// `owner_id`; nothing is changed in that case.
    /// Returns `RepositoryError::Database` if any statement fails.
    pub async fn update(
        &self,
        id: ProductId,
        owner_id: UserId,
        changes: &ProductChanges<'_>,
    ) -> Result<(Product, Vec<String>), RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let found: Option<ProductId> =
            sqlx::query_scalar("SELECT id FROM products WHERE id = $1 AND owner_id = $2 FOR UPDATE")
                .bind(id)
                .bind(owner_id)
                .fetch_optional(&mut *tx)
                .await?;

        if found.is_none() {
            return Err(RepositoryError::NotFound);
        }

        sqlx::query(
            "UPDATE products
             SET name = COALESCE($3, name),
                 description = COALESCE($4, description),
                 price = COALESCE($5, price),
                 collection_id = CASE WHEN $6 THEN $7 ELSE collection_id END,
                 updated_at = NOW()
             WHERE id = $1 AND owner_id = $2",
        )
        .bind(id)
        .bind(owner_id)
        .bind(changes.name)
        .bind(changes.description)
        .bind(changes.price)
        .bind(changes.collection_id.is_some())
        .bind(changes.collection_id.flatten())
        .execute(&mut *tx)
        .await?;

        let removed = images::delete_selected(&mut tx, id, changes.delete_image_ids).await?;
        images::append(&mut tx, id, changes.new_image_urls).await?;
        images::refresh_cover(&mut tx, id).await?;

        tx.commit().await?;

        let product = self
            .get_owned(id, owner_id)
            .await?
            .ok_or(RepositoryError::NotFound)?;
        Ok((product, removed))
    }

    /// Delete a product and its images.
    ///
    /// Returns the URLs of the removed images.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if no product matches `id` and `owner_id`.
    /// Returns `RepositoryError::Database` if any statement fails.
    pub async fn delete(
        &self,
        id: ProductId,
        owner_id: UserId,
    ) -> Result<Vec<String>, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let found: Option<ProductId> =
            sqlx::query_scalar("SELECT id FROM products WHERE id = $1 AND owner_id = $2 FOR UPDATE")
                .bind(id)
                .bind(owner_id)
                .fetch_optional(&mut *tx)
                .await?;

        if found.is_none() {
            return Err(RepositoryError::NotFound);
        }

        let removed = images::delete_for_product(&mut tx, id).await?;

        sqlx::query("DELETE FROM products WHERE id = $1 AND owner_id = $2")
            .bind(id)
            .bind(owner_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(removed)
    }

    async fn attach_images(&self, rows: Vec<ProductRow>) -> Result<Vec<Product>, RepositoryError> {
        let ids: Vec<ProductId> = rows.iter().map(|row| row.id).collect();
        let mut images = ProductImageRepository::new(self.pool)
            .list_for_products(&ids)
            .await?;

        Ok(rows
            .into_iter()
            .map(|row| {
                let product_images = images.remove(&row.id).unwrap_or_default();
                row.into_product(product_images)
            })
            .collect())
    }
}
