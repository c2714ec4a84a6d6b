//! Domain models for the Divino Alimento marketplace

mod composition;
mod cycle;
mod draft;
mod migration;
mod offer;
mod selection;
mod stage;

pub use composition::*;
pub use cycle::*;
pub use draft::*;
pub use migration::*;
pub use offer::*;
pub use selection::*;
pub use stage::*;
