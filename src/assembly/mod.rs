//! Borehole assembly and the project-wide combine run.

mod borehole;
mod combine;

pub use borehole::{BoreholeAssembler, BoreholeOutcome};
pub use combine::{Combiner, ProjectSource};
