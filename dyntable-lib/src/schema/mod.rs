//! Column schema derivation
//!
//! Turns a field path list plus server metadata into render-ready columns.

mod action;
mod builder;
mod column;
mod path;

pub use action::*;
pub use builder::*;
pub use column::*;
pub use path::*;
