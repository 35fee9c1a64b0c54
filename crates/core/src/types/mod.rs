//! Core types for Vitrine.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod email;
pub mod id;
pub mod phone;
pub mod price;
pub mod quota;
pub mod share_token;
pub mod username;

pub use email::{Email, EmailError};
pub use id::*;
pub use phone::{PhoneNumber, PhoneNumberError};
pub use price::{Price, PriceError};
pub use quota::{PlanLimit, ResourceKind};
pub use share_token::{ShareToken, ShareTokenError};
pub use username::{Username, UsernameError};
