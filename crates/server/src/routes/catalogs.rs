//! Public catalog view of a shared collection.

use axum::{
    extract::{Path, State},
    response::IntoResponse,
};
use serde::Serialize;

use crate::error::{AppError, Result};
use crate::models::{Product, PublicCollection};
use crate::routes::ApiJson;
use crate::services::share::ShareService;
use crate::state::AppState;

#[derive(Debug, Serialize)]
struct Catalog {
    collection: PublicCollection,
    products: Vec<Product>,
}

/// Resolve a share token to its collection and products.
pub async fn show(
    State(state): State<AppState>,
    Path(token): Path<String>,
) -> Result<impl IntoResponse> {
    let (collection, products) = ShareService::new(state.pool())
        .resolve(&token)
        .await?
        .ok_or_else(|| AppError::NotFound("Catalog".to_string()))?;

    Ok(ApiJson(Catalog {
        collection: collection.into(),
        products,
    }))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::http::{Method, StatusCode};

    use crate::routes::router;
    use crate::routes::tests::{send, test_state};

    #[tokio::test]
    async fn test_malformed_token_is_not_found() {
        let (status, body) = send(
            router(test_state()),
            Method::GET,
            "/public/catalogs/short",
            None,
            None,
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "Catalog not found");
    }
}
