//! Public share tokens for collections.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use rand::RngCore;
use sqlx::PgPool;

use vitrine_core::{CollectionId, ShareToken, UserId};

use crate::db::products::ProductFilter;
use crate::db::{CollectionRepository, ProductRepository, RepositoryError};
use crate::models::{Collection, Product};

/// Generate a fresh random share token.
///
/// # Errors
///
/// Returns `RepositoryError::DataCorruption` if the encoded token fails its
/// own shape check, which would indicate a constant mismatch.
pub fn generate_token() -> Result<ShareToken, RepositoryError> {
    let mut bytes = [0u8; ShareToken::RANDOM_BYTES];
    rand::rng().fill_bytes(&mut bytes);
    let encoded = URL_SAFE_NO_PAD.encode(bytes);

    ShareToken::parse(&encoded)
        .map_err(|e| RepositoryError::DataCorruption(format!("generated share token invalid: {e}")))
}

/// Mints and resolves collection share tokens.
pub struct ShareService<'a> {
    pool: &'a PgPool,
}

impl<'a> ShareService<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Return the collection's share token, minting it on first call.
    ///
    /// Repeated calls return the same token.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the collection does not exist
    /// or is not owned by `owner_id`.
    pub async fn share(
        &self,
        collection_id: CollectionId,
        owner_id: UserId,
    ) -> Result<ShareToken, RepositoryError> {
        let collections = CollectionRepository::new(self.pool);

        let collection = collections
            .get_owned(collection_id, owner_id)
            .await?
            .ok_or(RepositoryError::NotFound)?;

        if let Some(token) = collection.share_token {
            return Ok(token);
        }

        let token = generate_token()?;
        let stored = collections
            .set_share_token_if_absent(collection_id, owner_id, &token)
            .await?;

        tracing::info!(collection_id = %collection_id, "Collection shared");
        Ok(stored)
    }

    /// Resolve a share token to its collection and that collection's products.
    ///
    /// Malformed and unknown tokens both resolve to `None`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn resolve(
        &self,
        raw_token: &str,
    ) -> Result<Option<(Collection, Vec<Product>)>, RepositoryError> {
        let Ok(token) = ShareToken::parse(raw_token) else {
            return Ok(None);
        };

        let Some(collection) = CollectionRepository::new(self.pool)
            .get_by_share_token(&token)
            .await?
        else {
            return Ok(None);
        };

        let products = ProductRepository::new(self.pool)
            .list(ProductFilter {
                owner_id: Some(collection.owner_id),
                collection_id: Some(collection.id),
            })
            .await?;

        Ok(Some((collection, products)))
    }
}
