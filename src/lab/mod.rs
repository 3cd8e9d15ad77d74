//! Offline collaborators for the research engine.
//!
//! - [`CatalogGenerator`]: seeded sampling from design pattern catalogs
//! - [`HeuristicEvaluator`]: keyword rule scoring, parallel over a batch
//! - [`JsonReporter`]: writes a browsable JSON bundle per run

mod catalog;
mod heuristic;
mod report;

pub use catalog::CatalogGenerator;
pub use heuristic::HeuristicEvaluator;
pub use report::{JsonReporter, load_result};
