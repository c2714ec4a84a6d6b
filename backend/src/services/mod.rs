//! Business logic services for the Divino Alimento server

pub mod catalog;
pub mod composition;
pub mod migration;
pub mod stage;

pub use catalog::CatalogService;
pub use composition::{CompositionScope, CompositionService};
pub use migration::MigrationService;
pub use stage::StageService;
