//! UI/UX Genome Lab - Evolutionary exploration of UI/UX design concepts.
//!
//! A research run repeatedly asks a generator for design concepts, has an
//! evaluator score them on usability, accessibility, visual clarity, and
//! implementation complexity, and keeps the best concept found so far.
//!
//! # Architecture
//!
//! - `schema`: Configuration, design, and result types
//! - `search`: Fitness, candidate store, capability traits, and the engine
//! - `lab`: Offline generator, evaluator, and reporter implementations
//!
//! # Example
//!
//! ```rust,no_run
//! use uiux_genome_lab::{
//!     lab::{CatalogGenerator, HeuristicEvaluator, JsonReporter},
//!     schema::ResearchConfig,
//!     search::ResearchEngine,
//! };
//!
//! let config = ResearchConfig {
//!     problem_statement: "Onboarding for a budgeting app".to_string(),
//!     max_generations: 3,
//!     ..ResearchConfig::default()
//! };
//!
//! let mut engine = ResearchEngine::new(
//!     config,
//!     CatalogGenerator::new(7),
//!     HeuristicEvaluator::default(),
//! )
//! .with_reporter(JsonReporter::new("Output"));
//!
//! match engine.run() {
//!     Ok(result) => println!("Explored {} concepts", result.all_candidates().len()),
//!     Err(failure) => eprintln!("Run failed: {failure}"),
//! }
//! ```

pub mod lab;
pub mod schema;
pub mod search;

// Re-export commonly used types
pub use schema::{Candidate, LabConfig, ResearchConfig, ResearchResult};
pub use search::{ResearchEngine, ResearchError, ResearchFailure};
