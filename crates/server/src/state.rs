//! Application state shared across handlers.

use std::sync::Arc;

use sqlx::PgPool;

use crate::config::ServerConfig;
use crate::middleware::rate_limit::RateLimiter;
use crate::services::storage::UploadStore;
use crate::services::tokens::TokenService;

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// shared resources like database connections and configuration.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: ServerConfig,
    pool: PgPool,
    tokens: TokenService,
    uploads: UploadStore,
    login_limiter: Arc<dyn RateLimiter>,
    register_limiter: Arc<dyn RateLimiter>,
}

impl AppState {
    /// Create application state with caller-supplied rate limiters.
    #[must_use]
    pub fn with_limiters(
        config: ServerConfig,
        pool: PgPool,
        login_limiter: Arc<dyn RateLimiter>,
        register_limiter: Arc<dyn RateLimiter>,
    ) -> Self {
        let tokens = TokenService::new(&config.auth);
        let uploads = UploadStore::new(config.uploads.dir.clone());

        Self {
            inner: Arc::new(AppStateInner {
                config,
                pool,
                tokens,
                uploads,
                login_limiter,
                register_limiter,
            }),
        }
    }

    /// Get a reference to the server configuration.
    #[must_use]
    pub fn config(&self) -> &ServerConfig {
        &self.inner.config
    }

    /// Get a reference to the database connection pool.
    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.inner.pool
    }

    /// Get a reference to the bearer token service.
    #[must_use]
    pub fn tokens(&self) -> &TokenService {
        &self.inner.tokens
    }

    /// Get a reference to the upload store.
    #[must_use]
    pub fn uploads(&self) -> &UploadStore {
        &self.inner.uploads
    }

    /// Limiter guarding `POST /public/login`.
    #[must_use]
    pub fn login_limiter(&self) -> Arc<dyn RateLimiter> {
        Arc::clone(&self.inner.login_limiter)
    }

    /// Limiter guarding `POST /public/register`.
    #[must_use]
    pub fn register_limiter(&self) -> Arc<dyn RateLimiter> {
        Arc::clone(&self.inner.register_limiter)
    }
}
