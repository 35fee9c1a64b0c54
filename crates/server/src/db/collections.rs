//! Collection repository.
//!
//! Every mutating query is scoped to `id AND owner_id`, so a collection that
//! exists under another owner is indistinguishable from one that does not.

use sqlx::PgPool;

use vitrine_core::{CollectionId, ShareToken, UserId};

use super::RepositoryError;
use crate::models::Collection;

const COLLECTION_COLUMNS: &str =
    "id, owner_id, name, description, share_token, created_at, updated_at";

/// Repository for collection database operations.
pub struct CollectionRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CollectionRepository<'a> {
    /// Create a new collection repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Count collections owned by a user.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn count_by_owner(&self, owner_id: UserId) -> Result<i64, RepositoryError> {
        let count = sqlx::query_scalar("SELECT COUNT(*) FROM collections WHERE owner_id = $1")
            .bind(owner_id)
            .fetch_one(self.pool)
            .await?;

        Ok(count)
    }

    /// Insert a new collection.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn create(
        &self,
        owner_id: UserId,
        name: &str,
        description: &str,
    ) -> Result<Collection, RepositoryError> {
        let collection = sqlx::query_as(&format!(
            "INSERT INTO collections (owner_id, name, description)
             VALUES ($1, $2, $3)
             RETURNING {COLLECTION_COLUMNS}"
        ))
        .bind(owner_id)
        .bind(name)
        .bind(description)
        .fetch_one(self.pool)
        .await?;

        Ok(collection)
    }

    /// List a user's collections, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_by_owner(&self, owner_id: UserId) -> Result<Vec<Collection>, RepositoryError> {
        let collections = sqlx::query_as(&format!(
            "SELECT {COLLECTION_COLUMNS} FROM collections
             WHERE owner_id = $1
             ORDER BY created_at DESC, id DESC"
        ))
        .bind(owner_id)
        .fetch_all(self.pool)
        .await?;

        Ok(collections)
    }

    /// Get a collection if it is owned by `owner_id`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_owned(
        &self,
        id: CollectionId,
        owner_id: UserId,
    ) -> Result<Option<Collection>, RepositoryError> {
        let collection = sqlx::query_as(&format!(
            "SELECT {COLLECTION_COLUMNS} FROM collections WHERE id = $1 AND owner_id = $2"
        ))
        .bind(id)
        .bind(owner_id)
        .fetch_optional(self.pool)
        .await?;

        Ok(collection)
    }

    /// Get the collection a share token points at.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_share_token(
        &self,
        token: &ShareToken,
    ) -> Result<Option<Collection>, RepositoryError> {
        let collection = sqlx::query_as(&format!(
            "SELECT {COLLECTION_COLUMNS} FROM collections WHERE share_token = $1"
        ))
        .bind(token)
        .fetch_optional(self.pool)
        .await?;

        Ok(collection)
    }

    /// Update the fields that are present, leaving the rest unchanged.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if no collection matches `id` and `owner_id`.
    /// Returns `RepositoryError::Database` if the update fails.
    pub async fn update(
        &self,
        id: CollectionId,
        owner_id: UserId,
        name: Option<&str>,
        description: Option<&str>,
    ) -> Result<Collection, RepositoryError> {
        let collection: Option<Collection> = sqlx::query_as(&format!(
            "UPDATE collections
             SET name = COALESCE($3, name),
                 description = COALESCE($4, description),
                 updated_at = NOW()
             WHERE id = $1 AND owner_id = $2
             RETURNING {COLLECTION_COLUMNS}"
        ))
        .bind(id)
        .bind(owner_id)
        .bind(name)
        .bind(description)
        .fetch_optional(self.pool)
        .await?;

        collection.ok_or(RepositoryError::NotFound)
    }

    /// Store a share token unless the collection already has one.
    ///
    /// Returns the token now stored on the collection, which is the existing
    /// one if another request set it first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if no collection matches `id` and `owner_id`.
    /// Returns `RepositoryError::Conflict` if the token collides with another collection's.
    pub async fn set_share_token_if_absent(
        &self,
        id: CollectionId,
        owner_id: UserId,
        token: &ShareToken,
    ) -> Result<ShareToken, RepositoryError> {
        let stored: Option<ShareToken> = sqlx::query_scalar(
            "UPDATE collections
             SET share_token = $3, updated_at = NOW()
             WHERE id = $1 AND owner_id = $2 AND share_token IS NULL
             RETURNING share_token",
        )
        .bind(id)
        .bind(owner_id)
        .bind(token)
        .fetch_optional(self.pool)
        .await
        .map_err(RepositoryError::from_unique_violation)?;

        if let Some(stored) = stored {
            return Ok(stored);
        }

        // Lost a race or the collection is not ours
        let existing: Option<Option<ShareToken>> =
            sqlx::query_scalar("SELECT share_token FROM collections WHERE id = $1 AND owner_id = $2")
                .bind(id)
                .bind(owner_id)
                .fetch_optional(self.pool)
                .await?;

        match existing {
            Some(Some(token)) => Ok(token),
            Some(None) => Err(RepositoryError::DataCorruption(
                "share token vanished after conditional update".to_owned(),
            )),
            None => Err(RepositoryError::NotFound),
        }
    }

    /// Delete a collection and every product of the same owner inside it.
    ///
    /// Both deletes run in one transaction. Returns the image URLs of the
    /// removed products so their files can be cleaned up after commit.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if no collection matches `id` and
    /// `owner_id`; nothing is deleted in that case.
    /// Returns `RepositoryError::Database` if any statement fails.
    pub async fn delete_with_products(
        &self,
        id: CollectionId,
        owner_id: UserId,
    ) -> Result<Vec<String>, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let found: Option<CollectionId> = sqlx::query_scalar(
            "SELECT id FROM collections WHERE id = $1 AND owner_id = $2 FOR UPDATE",
        )
        .bind(id)
        .bind(owner_id)
        .fetch_optional(&mut *tx)
        .await?;

        if found.is_none() {
            return Err(RepositoryError::NotFound);
        }

        let image_urls: Vec<String> = sqlx::query_scalar(
            "SELECT pi.image_url
             FROM product_images pi
             JOIN products p ON p.id = pi.product_id
             WHERE p.collection_id = $1 AND p.owner_id = $2",
        )
        .bind(id)
        .bind(owner_id)
        .fetch_all(&mut *tx)
        .await?;

        sqlx::query("DELETE FROM products WHERE collection_id = $1 AND owner_id = $2")
            .bind(id)
            .bind(owner_id)
            .execute(&mut *tx)
            .await?;

        sqlx::query("DELETE FROM collections WHERE id = $1 AND owner_id = $2")
            .bind(id)
            .bind(owner_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(image_urls)
    }
}
