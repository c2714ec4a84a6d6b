//! HTTP handlers for the Divino Alimento API

pub mod catalog;
pub mod composition;
pub mod health;
pub mod migration;
pub mod stages;

pub use catalog::*;
pub use composition::*;
pub use health::*;
pub use migration::*;
pub use stages::*;
