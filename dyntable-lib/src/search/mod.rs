//! Relationship search and selection

mod debounce;
mod key;
mod tracker;

pub use debounce::*;
pub use key::*;
pub use tracker::*;
