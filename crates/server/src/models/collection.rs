//! Collection (showcase) domain types.

use chrono::{DateTime, Utc};
use serde::Serialize;

use vitrine_core::{CollectionId, ShareToken, UserId};

/// A named, owned grouping of products.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Collection {
    pub id: CollectionId,
    pub owner_id: UserId,
    pub name: String,
    pub description: String,
    /// Set at most once, on the first share request.
    pub share_token: Option<ShareToken>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A collection as exposed to anonymous callers.
///
/// Omits the share token so that listing an owner's collections does not
/// hand out read access to them.
#[derive(Debug, Clone, Serialize)]
pub struct PublicCollection {
    pub id: CollectionId,
    pub owner_id: UserId,
    pub name: String,
    pub description: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Collection> for PublicCollection {
    fn from(collection: Collection) -> Self {
        Self {
            id: collection.id,
            owner_id: collection.owner_id,
            name: collection.name,
            description: collection.description,
            created_at: collection.created_at,
            updated_at: collection.updated_at,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_public_collection_omits_share_token() {
        let collection = Collection {
            id: CollectionId::new(1),
            owner_id: UserId::new(2),
            name: "Summer".to_string(),
            description: String::new(),
            share_token: Some(ShareToken::parse(&"a".repeat(ShareToken::ENCODED_LEN)).unwrap()),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        let json = serde_json::to_value(PublicCollection::from(collection)).unwrap();
        assert!(json.get("share_token").is_none());
        assert_eq!(json["owner_id"], 2);
    }
}
