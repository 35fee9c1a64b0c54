//! Product image repository.
//!
//! Image rows are only mutated together with their product, so the writers
//! here take a connection borrowed from the caller's transaction.

use std::collections::HashMap;

use sqlx::{PgConnection, PgPool};

use vitrine_core::{ProductId, ProductImageId};

use super::RepositoryError;
use crate::models::ProductImage;

/// Repository for reading product images.
pub struct ProductImageRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ProductImageRepository<'a> {
    /// Create a new product image repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Load the images of several products at once, grouped by product and
    /// ordered by position.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_for_products(
        &self,
        product_ids: &[ProductId],
    ) -> Result<HashMap<ProductId, Vec<ProductImage>>, RepositoryError> {
        if product_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let images: Vec<ProductImage> = sqlx::query_as(
            "SELECT id, product_id, image_url, position, created_at
             FROM product_images
             WHERE product_id = ANY($1)
             ORDER BY product_id, position, id",
        )
        .bind(product_ids)
        .fetch_all(self.pool)
        .await?;

        let mut grouped: HashMap<ProductId, Vec<ProductImage>> = HashMap::new();
        for image in images {
            grouped.entry(image.product_id).or_default().push(image);
        }
        Ok(grouped)
    }
}

/// Append images after the product's current highest position.
pub(super) async fn append(
    conn: &mut PgConnection,
    product_id: ProductId,
    image_urls: &[String],
) -> Result<(), RepositoryError> {
    if image_urls.is_empty() {
        return Ok(());
    }

    sqlx::query(
        "INSERT INTO product_images (product_id, image_url, position)
         SELECT $1, u.url, (base.next + u.ord - 1)::INTEGER
         FROM UNNEST($2::TEXT[]) WITH ORDINALITY AS u(url, ord),
              (SELECT COALESCE(MAX(position) + 1, 0) AS next
               FROM product_images WHERE product_id = $1) AS base",
    )
    .bind(product_id)
    .bind(image_urls)
    .execute(conn)
    .await?;

    Ok(())
}

/// Delete the given images, but only those that belong to `product_id`.
///
/// Returns the URLs of the removed rows.
pub(super) async fn delete_selected(
    conn: &mut PgConnection,
    product_id: ProductId,
    image_ids: &[ProductImageId],
) -> Result<Vec<String>, RepositoryError> {
    if image_ids.is_empty() {
        return Ok(Vec::new());
    }

    let urls = sqlx::query_scalar(
        "DELETE FROM product_images
         WHERE product_id = $1 AND id = ANY($2)
         RETURNING image_url",
    )
    .bind(product_id)
    .bind(image_ids)
    .fetch_all(conn)
    .await?;

    Ok(urls)
}

/// Delete every image of a product, returning their URLs.
pub(super) async fn delete_for_product(
    conn: &mut PgConnection,
    product_id: ProductId,
) -> Result<Vec<String>, RepositoryError> {
    let urls = sqlx::query_scalar("DELETE FROM product_images WHERE product_id = $1 RETURNING image_url")
        .bind(product_id)
        .fetch_all(conn)
        .await?;

    Ok(urls)
}

/// Mirror the lowest-position image into `products.image_url`.
pub(super) async fn refresh_cover(
    conn: &mut PgConnection,
    product_id: ProductId,
) -> Result<(), RepositoryError> {
    sqlx::query(
        "UPDATE products
         SET image_url = (
             SELECT image_url FROM product_images
             WHERE product_id = $1
             ORDER BY position, id
             LIMIT 1
         )
         WHERE id = $1",
    )
    .bind(product_id)
    .execute(conn)
    .await?;

    Ok(())
}
