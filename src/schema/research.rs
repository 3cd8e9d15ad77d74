//! Research run records: the result, its history, and progress updates.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{Candidate, ScoreCard};
use crate::search::{CandidateStore, StoreError};

/// Accumulated record of one research run.
///
/// Only the engine mutates a result; once the run terminates it is handed out
/// by value and has no public mutators. On deserialization the best candidate
/// is re-derived from the loaded candidates rather than trusted.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(from = "ResultRecord")]
pub struct ResearchResult {
    job_id: String,
    started_at: DateTime<Utc>,
    completed_at: Option<DateTime<Utc>>,
    status: RunStatus,
    stop_reason: Option<StopReason>,
    all_candidates: CandidateStore,
    best_candidate_id: Option<String>,
    history: Vec<GenerationSummary>,
}

impl ResearchResult {
    pub(crate) fn start(started_at: DateTime<Utc>) -> Self {
        Self {
            job_id: Uuid::new_v4().to_string(),
            started_at,
            completed_at: None,
            status: RunStatus::Running,
            stop_reason: None,
            all_candidates: CandidateStore::new(),
            best_candidate_id: None,
            history: Vec::new(),
        }
    }

    pub fn job_id(&self) -> &str {
        &self.job_id
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// Set when the run completed or was cancelled; `None` while running and for failed runs.
    pub fn completed_at(&self) -> Option<DateTime<Utc>> {
        self.completed_at
    }

    pub fn status(&self) -> RunStatus {
        self.status
    }

    pub fn stop_reason(&self) -> Option<&StopReason> {
        self.stop_reason.as_ref()
    }

    /// Every candidate ever produced, in discovery order.
    pub fn all_candidates(&self) -> &[Candidate] {
        self.all_candidates.as_slice()
    }

    pub fn candidate(&self, id: &str) -> Option<&Candidate> {
        self.all_candidates.get(id)
    }

    pub fn best_candidate(&self) -> Option<&Candidate> {
        self.best_candidate_id
            .as_deref()
            .and_then(|id| self.all_candidates.get(id))
    }

    /// Fully scored candidates, best first.
    pub fn ranked(&self) -> Vec<&Candidate> {
        self.all_candidates.ranked()
    }

    pub fn history(&self) -> &[GenerationSummary] {
        &self.history
    }

    /// Number of generations that went through selection.
    pub fn generations_completed(&self) -> usize {
        self.history.len()
    }

    pub fn is_finalized(&self) -> bool {
        self.status != RunStatus::Running
    }

    pub(crate) fn register(&mut self, candidate: Candidate) -> Result<(), StoreError> {
        self.all_candidates.insert(candidate)
    }

    pub(crate) fn apply_score(&mut self, id: &str, card: ScoreCard) -> bool {
        self.all_candidates.apply_score(id, card)
    }

    /// Promote `id` to best if it is rankable and strictly fitter than the
    /// current best. Returns whether the best changed.
    pub(crate) fn offer_best(&mut self, id: &str) -> bool {
        let Some(challenger) = self.all_candidates.get(id) else {
            return false;
        };
        if !challenger.is_rankable() {
            return false;
        }
        let Some(fitness) = challenger.fitness() else {
            return false;
        };

        let improves = match self.best_candidate().and_then(Candidate::fitness) {
            Some(best) => fitness > best,
            None => !fitness.is_nan(),
        };
        if improves {
            self.best_candidate_id = Some(id.to_string());
        }
        improves
    }

    pub(crate) fn record_generation(&mut self, summary: GenerationSummary) {
        self.history.push(summary);
    }

    pub(crate) fn finish(&mut self, status: RunStatus, stop_reason: Option<StopReason>) {
        if status != RunStatus::Failed {
            self.completed_at = Some(Utc::now());
        }
        self.status = status;
        self.stop_reason = stop_reason;
    }
}

/// Stored form of a result; `best_candidate_id` is recomputed on load.
#[derive(Deserialize)]
struct ResultRecord {
    job_id: String,
    started_at: DateTime<Utc>,
    completed_at: Option<DateTime<Utc>>,
    status: RunStatus,
    stop_reason: Option<StopReason>,
    all_candidates: CandidateStore,
    #[serde(default)]
    history: Vec<GenerationSummary>,
}

impl From<ResultRecord> for ResearchResult {
    fn from(record: ResultRecord) -> Self {
        let mut result = Self {
            job_id: record.job_id,
            started_at: record.started_at,
            completed_at: record.completed_at,
            status: record.status,
            stop_reason: record.stop_reason,
            all_candidates: record.all_candidates,
            best_candidate_id: None,
            history: record.history,
        };
        let ids: Vec<String> = result
            .all_candidates()
            .iter()
            .map(|c| c.id().to_string())
            .collect();
        for id in &ids {
            result.offer_best(id);
        }
        result
    }
}

/// Lifecycle status of a run.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum RunStatus {
    Running,
    Completed,
    Cancelled,
    Failed,
}

/// Reason a run stopped.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum StopReason {
    /// Reached maximum generations.
    MaxGenerations,
    /// Wall-clock budget exhausted.
    Deadline,
    /// Generator returned no candidates.
    Exhausted,
    /// Cancellation was requested.
    Cancelled,
    /// A capability failed and the policy kept the partial result.
    CapabilityFailed(String),
}

/// Per-generation statistics, recorded at selection time.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GenerationSummary {
    pub generation: usize,
    /// Candidates registered this generation.
    pub produced: usize,
    /// Candidates that received a complete score card with a non-NaN fitness.
    pub scored: usize,
    /// Best fitness among this generation's rankable candidates.
    #[serde(default, with = "super::design::score_value")]
    pub generation_best: Option<f64>,
    /// Mean fitness among this generation's rankable candidates.
    #[serde(default, with = "super::design::score_value")]
    pub mean_fitness: Option<f64>,
    /// Seconds since the run started.
    pub elapsed_seconds: f64,
}

/// Current phase of the research loop.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum ResearchPhase {
    #[default]
    Initializing,
    Generating,
    Evaluating,
    Selecting,
    Terminated,
}

/// Progress update emitted at each phase transition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResearchProgress {
    pub job_id: String,
    pub generation: usize,
    pub max_generations: usize,
    pub phase: ResearchPhase,
    pub candidates_seen: usize,
    pub best_fitness: Option<f64>,
    pub best_candidate_id: Option<String>,
}
