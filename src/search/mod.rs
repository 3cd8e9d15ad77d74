//! Evolutionary search over UI/UX design concepts.
//!
//! This module holds the research engine and the contracts it consumes.
//!
//! # Overview
//!
//! - **Fitness** (`fitness`): fixed-weight scalar over the four score axes
//! - **Candidate Store** (`store`): discovery-ordered registry keyed by id
//! - **Capabilities** (`capability`): generator, evaluator, and reporter traits
//! - **Engine** (`engine`): the generate / evaluate / select loop
//!
//! # Example
//!
//! ```rust,no_run
//! use uiux_genome_lab::schema::ResearchConfig;
//! use uiux_genome_lab::search::ResearchEngine;
//! use uiux_genome_lab::lab::{CatalogGenerator, HeuristicEvaluator};
//!
//! let config = ResearchConfig::default();
//! let mut engine = ResearchEngine::new(
//!     config,
//!     CatalogGenerator::new(42),
//!     HeuristicEvaluator::default(),
//! );
//!
//! let result = engine
//!     .run_with_callback(|progress| {
//!         println!("Generation {}: {:?}", progress.generation, progress.phase);
//!     })
//!     .expect("research run failed");
//!
//! if let Some(best) = result.best_candidate() {
//!     println!("Best concept: {} ({:?})", best.name, best.fitness());
//! }
//! ```
//!
//! # Termination
//!
//! A run stops when the generation cap is reached, when the wall-clock budget
//! has passed at selection time, when the generator returns no candidates, or
//! when cancellation is requested. Capability failures end the run with the
//! partial result attached.

mod capability;
mod engine;
mod fitness;
mod store;

pub use capability::{
    CancelToken, CandidateEvaluator, CandidateGenerator, CapabilityError, GenerationRequest,
    PublishReceipt, ReportError, RunReporter, ScoreSheet, SurvivorDigest,
};
pub use engine::{ResearchEngine, ResearchError, ResearchFailure};
pub use fitness::{
    ACCESSIBILITY_WEIGHT, COMPLEXITY_PENALTY, USABILITY_WEIGHT, VISUAL_CLARITY_WEIGHT, fitness,
};
pub use store::{CandidateStore, StoreError};
