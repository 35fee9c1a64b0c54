//! Vitrine Core - Shared types library.
//!
//! This crate provides common types used across all Vitrine components:
//! - `server` - Catalog HTTP API
//! - `cli` - Command-line tools for migrations and plan management
//!
//! # Architecture
//!
//! The core crate contains only types and validation - no I/O, no database
//! access, no HTTP clients. This keeps it lightweight and allows it to be
//! used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for type-safe IDs, contact details,
//!   share tokens, prices and plan quotas

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
