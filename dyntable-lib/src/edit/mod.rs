//! Edit accumulation, validation and commit

pub mod canonical;
mod errors;
mod reconciler;

pub use errors::*;
pub use reconciler::*;
