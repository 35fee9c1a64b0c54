//! HTTP middleware stack.
//!
//! # Middleware Order (outermost first)
//!
//! 1. Sentry layers (capture errors, transactions)
//! 2. `TraceLayer` (request tracing)
//! 3. Request ID (add unique ID to each request)
//! 4. CORS
//! 5. Rate limiting (login and register routes only)
//! 6. Bearer auth (`/protected` routes only)

pub mod auth;
pub mod rate_limit;
pub mod request_id;

pub use auth::{AuthUser, RequireAuth, require_bearer};
pub use rate_limit::{FixedWindowLimiter, RateLimiter, rate_limit_middleware};
pub use request_id::request_id_middleware;
