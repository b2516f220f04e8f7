//! Domain models for patient records.

mod record;
mod visit;

pub use record::*;
pub use visit::*;
