//! Vitrine catalog server library.
//!
//! Users register, sign in with a bearer token, group products into
//! collections within the limits of their plan, and share a collection
//! publicly through an opaque token. The binary in `main.rs` wires this
//! library to configuration, logging, and a TCP listener.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;
