//! Typed models

mod field_type;
pub mod keys;
mod metadata;
mod record;
mod row;
mod value;

pub use field_type::*;
pub use metadata::*;
pub use record::*;
pub use row::*;
pub use value::*;
