//! Capability contracts consumed by the research engine.
//!
//! Generation, evaluation, and publishing are injected into the engine as trait
//! objects so each can be swapped independently. Closures implement the
//! generator and evaluator traits directly.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::schema::{Candidate, DesignDraft, DesignSpec, ResearchBrief, ResearchResult, ScoreCard};

/// Evaluator output: score cards keyed by candidate id.
pub type ScoreSheet = HashMap<String, ScoreCard>;

/// Shared run-wide cancellation flag.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation. Observed at the next phase boundary, and by any
    /// capability that polls the token.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Compact description of a prior survivor, passed to the generator.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SurvivorDigest {
    pub id: String,
    pub name: String,
    pub summary: String,
    pub fitness: f64,
    pub spec: DesignSpec,
}

impl SurvivorDigest {
    /// Digest a rankable candidate. Returns `None` unless every axis is scored.
    pub fn from_candidate(candidate: &Candidate) -> Option<Self> {
        if !candidate.is_rankable() {
            return None;
        }
        Some(Self {
            id: candidate.id().to_string(),
            name: candidate.name.clone(),
            summary: candidate.summary.clone(),
            fitness: candidate.fitness()?,
            spec: candidate.spec.clone(),
        })
    }
}

/// Everything a generator is given for one generation.
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    pub brief: ResearchBrief,
    pub generation: usize,
    pub population_size: usize,
    /// Top survivors so far, best first. Empty on the first generation.
    pub survivors: Vec<SurvivorDigest>,
    /// Time left before the run deadline.
    pub remaining: Duration,
}

/// Produces new design drafts for a generation.
pub trait CandidateGenerator: Send {
    /// Return up to `request.population_size` drafts. An empty vector means the
    /// design space is exhausted; an error means the capability failed.
    fn generate(
        &mut self,
        request: &GenerationRequest,
        cancel: &CancelToken,
    ) -> Result<Vec<DesignDraft>, CapabilityError>;
}

/// Scores a batch of candidates.
pub trait CandidateEvaluator: Send {
    /// Return score cards keyed by id. Missing entries leave candidates
    /// unscored; entries for unknown ids are ignored by the engine.
    fn score(
        &mut self,
        batch: &[Candidate],
        brief: &ResearchBrief,
        cancel: &CancelToken,
    ) -> Result<ScoreSheet, CapabilityError>;
}

/// Persists a finished research result.
pub trait RunReporter: Send {
    fn publish(&mut self, result: &ResearchResult) -> Result<PublishReceipt, ReportError>;
}

impl<F> CandidateGenerator for F
where
    F: FnMut(&GenerationRequest, &CancelToken) -> Result<Vec<DesignDraft>, CapabilityError> + Send,
{
    fn generate(
        &mut self,
        request: &GenerationRequest,
        cancel: &CancelToken,
    ) -> Result<Vec<DesignDraft>, CapabilityError> {
        self(request, cancel)
    }
}

impl<F> CandidateEvaluator for F
where
    F: FnMut(&[Candidate], &ResearchBrief, &CancelToken) -> Result<ScoreSheet, CapabilityError>
        + Send,
{
    fn score(
        &mut self,
        batch: &[Candidate],
        brief: &ResearchBrief,
        cancel: &CancelToken,
    ) -> Result<ScoreSheet, CapabilityError> {
        self(batch, brief, cancel)
    }
}

/// Where a reporter put the published bundle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishReceipt {
    pub bundle_dir: PathBuf,
    pub index_path: PathBuf,
}

/// Failure of a generator or evaluator call.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CapabilityError {
    #[error("capability unavailable: {0}")]
    Unavailable(String),
    #[error("malformed capability output: {0}")]
    Malformed(String),
    #[error("cancelled")]
    Cancelled,
}

/// Failure to publish a research result.
#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}
