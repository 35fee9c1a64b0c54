//! Business logic services.
//!
//! # Services
//!
//! - `auth` - Registration, password login, and profile changes
//! - `tokens` - Bearer token issuing and verification
//! - `quota` - Plan limits on owned products and collections
//! - `share` - Public share tokens for collections
//! - `storage` - Uploaded image files

pub mod auth;
pub mod quota;
pub mod share;
pub mod storage;
pub mod tokens;
