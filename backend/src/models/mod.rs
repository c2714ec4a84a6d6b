//! Domain models for the Divino Alimento server
//!
//! Re-exports the composition engine from the shared crate

pub use shared::models::*;
pub use shared::types::*;
