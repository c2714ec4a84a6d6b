//! Shared types and models for the Divino Alimento marketplace
//!
//! This crate holds the offer allocation and composition engine used by the
//! backend and, through WASM, by the admin frontend.

pub mod models;
pub mod types;
pub mod validation;

pub use models::*;
pub use types::*;
pub use validation::*;
