//! Dynamic editable table engine
//!
//! Turns a list of field paths plus server-reported field metadata into a
//! typed column schema, flattens raw records into rows with collision-safe
//! keys, and reconciles cell edits into a validated patch set ready for a
//! bulk commit. Record retrieval, updates, deletes and search are injected
//! through the traits in [`backend`].

pub mod assimilate;
pub mod backend;
pub mod config;
pub mod edit;
pub mod error;
pub mod event;
pub mod model;
pub mod schema;
pub mod search;

mod table;

pub use error::Error;
pub use table::*;
