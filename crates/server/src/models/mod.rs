//! Domain models for the catalog.
//!
//! These are validated domain types, separate from the `sqlx::FromRow` row
//! types that live next to each repository.

pub mod collection;
pub mod plan;
pub mod product;
pub mod user;

pub use collection::{Collection, PublicCollection};
pub use plan::{Plan, PlanDefinition, UserPlanInfo};
pub use product::{Product, ProductImage};
pub use user::User;
