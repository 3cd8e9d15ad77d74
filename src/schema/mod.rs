//! Schema module - Configuration, design concept, and run record types.

mod config;
mod design;
mod research;

pub use config::*;
pub use design::*;
pub use research::*;
