//! Research engine: the generation / evaluation / selection loop.

use std::time::Instant;

use chrono::Utc;
use log::{debug, info, warn};

use crate::schema::{
    Candidate, ConfigError, DesignDraft, GenerationSummary, ResearchBrief, ResearchConfig,
    ResearchPhase, ResearchProgress, ResearchResult, RunStatus, StopReason,
};

use super::capability::{
    CancelToken, CandidateEvaluator, CandidateGenerator, CapabilityError, GenerationRequest,
    PublishReceipt, RunReporter, ScoreSheet, SurvivorDigest,
};
use super::store::StoreError;

/// Drives a research run over injected generator and evaluator capabilities.
pub struct ResearchEngine {
    config: ResearchConfig,
    generator: Box<dyn CandidateGenerator>,
    evaluator: Box<dyn CandidateEvaluator>,
    reporter: Option<Box<dyn RunReporter>>,
    cancel: CancelToken,
    publication: Option<PublishReceipt>,
}

impl ResearchEngine {
    /// Create a new research engine.
    pub fn new(
        config: ResearchConfig,
        generator: impl CandidateGenerator + 'static,
        evaluator: impl CandidateEvaluator + 'static,
    ) -> Self {
        Self {
            config,
            generator: Box::new(generator),
            evaluator: Box::new(evaluator),
            reporter: None,
            cancel: CancelToken::new(),
            publication: None,
        }
    }

    /// Hand finished results to a reporter.
    pub fn with_reporter(mut self, reporter: impl RunReporter + 'static) -> Self {
        self.reporter = Some(Box::new(reporter));
        self
    }

    /// Share an externally owned cancellation token.
    pub fn with_cancel_token(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Get cancellation handle.
    pub fn cancel_handle(&self) -> CancelToken {
        self.cancel.clone()
    }

    pub fn config(&self) -> &ResearchConfig {
        &self.config
    }

    /// Receipt from the most recent successful publish, if any.
    pub fn publication(&self) -> Option<&PublishReceipt> {
        self.publication.as_ref()
    }

    /// Run research (blocking).
    pub fn run(&mut self) -> Result<ResearchResult, ResearchFailure> {
        self.run_with_callback(|_| {})
    }

    /// Run research with a progress callback invoked at every phase transition.
    pub fn run_with_callback<F>(&mut self, mut callback: F) -> Result<ResearchResult, ResearchFailure>
    where
        F: FnMut(&ResearchProgress),
    {
        if let Err(err) = self.config.validate() {
            return Err(ResearchFailure {
                error: err.into(),
                partial: None,
            });
        }

        let started = Instant::now();
        let brief = self.config.brief();
        let mut result = ResearchResult::start(Utc::now());
        self.publication = None;

        info!(
            "Research {} started: population {}, up to {} generations, budget {:?}",
            result.job_id(),
            self.config.population_size,
            self.config.max_generations,
            self.config.max_duration
        );
        callback(&self.progress(&result, 0, ResearchPhase::Initializing));

        let outcome = self.evolve(&mut result, &brief, started, &mut callback);
        let finalized = self.finalize(result, outcome);

        if let Ok(result) = &finalized {
            callback(&self.progress(
                result,
                result.generations_completed().saturating_sub(1),
                ResearchPhase::Terminated,
            ));
            self.publish(result);
        }
        finalized
    }

    /// The generation loop. Returns why it stopped, or the error that ended it.
    fn evolve<F>(
        &mut self,
        result: &mut ResearchResult,
        brief: &ResearchBrief,
        started: Instant,
        callback: &mut F,
    ) -> Result<StopReason, ResearchError>
    where
        F: FnMut(&ResearchProgress),
    {
        let retry = self.config.failure_policy.retry_failed_step;
        let mut generation = 0;

        loop {
            if self.cancel.is_cancelled() {
                return Ok(StopReason::Cancelled);
            }

            // Generating
            callback(&self.progress(result, generation, ResearchPhase::Generating));
            let request = GenerationRequest {
                brief: brief.clone(),
                generation,
                population_size: self.config.population_size,
                survivors: self.survivors(result),
                remaining: self.config.max_duration.saturating_sub(started.elapsed()),
            };
            let generator = &mut self.generator;
            let drafts = match retry_step(retry, &self.cancel, "generate", generation, || {
                generator.generate(&request, &self.cancel)
            }) {
                Ok(drafts) => drafts,
                Err(CapabilityError::Cancelled) => return Ok(StopReason::Cancelled),
                Err(source) => return Err(ResearchError::Generation { generation, source }),
            };

            if drafts.is_empty() {
                info!("Generator returned no candidates at generation {generation}; stopping");
                return Ok(StopReason::Exhausted);
            }
            let batch = self.register(result, generation, drafts)?;

            if self.cancel.is_cancelled() {
                return Ok(StopReason::Cancelled);
            }

            // Evaluating
            callback(&self.progress(result, generation, ResearchPhase::Evaluating));
            let evaluator = &mut self.evaluator;
            let sheet = match retry_step(retry, &self.cancel, "score", generation, || {
                evaluator.score(&batch, brief, &self.cancel)
            }) {
                Ok(sheet) => sheet,
                Err(CapabilityError::Cancelled) => return Ok(StopReason::Cancelled),
                Err(source) => return Err(ResearchError::Evaluation { generation, source }),
            };

            // Selecting
            callback(&self.progress(result, generation, ResearchPhase::Selecting));
            let summary = select(result, generation, &batch, sheet, started);
            info!(
                "Generation {}: {}/{} scored, generation best {:?}, overall best {:?}",
                generation,
                summary.scored,
                summary.produced,
                summary.generation_best,
                result.best_candidate().map(Candidate::id)
            );
            result.record_generation(summary);

            if generation + 1 >= self.config.max_generations {
                return Ok(StopReason::MaxGenerations);
            }
            if started.elapsed() >= self.config.max_duration {
                info!("Research budget of {:?} exhausted", self.config.max_duration);
                return Ok(StopReason::Deadline);
            }
            generation += 1;
        }
    }

    /// Mint ids for this generation's drafts and register them.
    fn register(
        &self,
        result: &mut ResearchResult,
        generation: usize,
        mut drafts: Vec<DesignDraft>,
    ) -> Result<Vec<Candidate>, ResearchError> {
        if drafts.len() > self.config.population_size {
            warn!(
                "Generator returned {} drafts for a population of {}; truncating",
                drafts.len(),
                self.config.population_size
            );
            drafts.truncate(self.config.population_size);
        }

        let mut batch = Vec::with_capacity(drafts.len());
        for (position, draft) in drafts.into_iter().enumerate() {
            let candidate = Candidate::from_draft(generation, position, draft);
            result.register(candidate.clone())?;
            batch.push(candidate);
        }
        debug!("Registered {} candidates for generation {generation}", batch.len());
        Ok(batch)
    }

    /// Digests of the best candidates so far.
    fn survivors(&self, result: &ResearchResult) -> Vec<SurvivorDigest> {
        result
            .ranked()
            .into_iter()
            .take(self.config.survivor_digest_size)
            .filter_map(SurvivorDigest::from_candidate)
            .collect()
    }

    fn finalize(
        &self,
        mut result: ResearchResult,
        outcome: Result<StopReason, ResearchError>,
    ) -> Result<ResearchResult, ResearchFailure> {
        match outcome {
            Ok(reason) => {
                let status = if reason == StopReason::Cancelled {
                    RunStatus::Cancelled
                } else {
                    RunStatus::Completed
                };
                info!(
                    "Research {} finished after {} generations ({:?})",
                    result.job_id(),
                    result.generations_completed(),
                    reason
                );
                result.finish(status, Some(reason));
                Ok(result)
            }
            Err(error)
                if error.is_capability_failure()
                    && self.config.failure_policy.keep_partial_on_failure
                    && result.generations_completed() > 0 =>
            {
                warn!("Research {} stopped early: {}", result.job_id(), error);
                result.finish(
                    RunStatus::Completed,
                    Some(StopReason::CapabilityFailed(error.to_string())),
                );
                Ok(result)
            }
            Err(error) => {
                warn!("Research {} failed: {}", result.job_id(), error);
                result.finish(RunStatus::Failed, None);
                Err(ResearchFailure {
                    error,
                    partial: Some(result),
                })
            }
        }
    }

    fn publish(&mut self, result: &ResearchResult) {
        let Some(reporter) = self.reporter.as_mut() else {
            return;
        };
        match reporter.publish(result) {
            Ok(receipt) => {
                info!("Published research bundle to {}", receipt.bundle_dir.display());
                self.publication = Some(receipt);
            }
            Err(err) => warn!("Failed to publish research {}: {}", result.job_id(), err),
        }
    }

    fn progress(
        &self,
        result: &ResearchResult,
        generation: usize,
        phase: ResearchPhase,
    ) -> ResearchProgress {
        let best = result.best_candidate();
        ResearchProgress {
            job_id: result.job_id().to_string(),
            generation,
            max_generations: self.config.max_generations,
            phase,
            candidates_seen: result.all_candidates().len(),
            best_fitness: best.and_then(Candidate::fitness),
            best_candidate_id: best.map(|c| c.id().to_string()),
        }
    }
}

/// Run a capability call, retrying once on failure when allowed.
fn retry_step<T>(
    retry: bool,
    cancel: &CancelToken,
    step: &str,
    generation: usize,
    mut attempt: impl FnMut() -> Result<T, CapabilityError>,
) -> Result<T, CapabilityError> {
    match attempt() {
        Err(CapabilityError::Cancelled) => Err(CapabilityError::Cancelled),
        Err(err) if retry && !cancel.is_cancelled() => {
            warn!("{step} failed at generation {generation} ({err}); retrying once");
            attempt()
        }
        other => other,
    }
}

/// Merge scores by id, update the best candidate, and summarize the generation.
fn select(
    result: &mut ResearchResult,
    generation: usize,
    batch: &[Candidate],
    mut sheet: ScoreSheet,
    started: Instant,
) -> GenerationSummary {
    for candidate in batch {
        match sheet.remove(candidate.id()) {
            Some(card) => {
                result.apply_score(candidate.id(), card);
            }
            None => debug!("Candidate {} received no score", candidate.id()),
        }
    }
    if !sheet.is_empty() {
        debug!(
            "Discarded {} score entries for unknown ids at generation {generation}",
            sheet.len()
        );
    }

    let mut fitnesses = Vec::with_capacity(batch.len());
    for candidate in batch {
        result.offer_best(candidate.id());
        if let Some(scored) = result.candidate(candidate.id())
            && scored.is_rankable()
            && let Some(fitness) = scored.fitness()
            && !fitness.is_nan()
        {
            fitnesses.push(fitness);
        }
    }

    let generation_best = fitnesses.iter().copied().reduce(f64::max);
    let mean_fitness = if fitnesses.is_empty() {
        None
    } else {
        Some(fitnesses.iter().sum::<f64>() / fitnesses.len() as f64)
    };

    GenerationSummary {
        generation,
        produced: batch.len(),
        scored: fitnesses.len(),
        generation_best,
        mean_fitness,
        elapsed_seconds: started.elapsed().as_secs_f64(),
    }
}

/// Errors that end a research run.
#[derive(Debug, thiserror::Error)]
pub enum ResearchError {
    #[error("Invalid research configuration: {0}")]
    Configuration(#[from] ConfigError),
    #[error("Generation {generation} failed: {source}")]
    Generation {
        generation: usize,
        source: CapabilityError,
    },
    #[error("Evaluation of generation {generation} failed: {source}")]
    Evaluation {
        generation: usize,
        source: CapabilityError,
    },
    #[error("Selection anomaly: {0}")]
    SelectionAnomaly(#[from] StoreError),
}

impl ResearchError {
    /// Whether the error came from a generator or evaluator call.
    pub fn is_capability_failure(&self) -> bool {
        matches!(self, Self::Generation { .. } | Self::Evaluation { .. })
    }
}

/// A failed run, with whatever was discovered before the failure.
#[derive(Debug, thiserror::Error)]
#[error("{error}")]
pub struct ResearchFailure {
    #[source]
    pub error: ResearchError,
    /// `None` only when the run never started (invalid configuration).
    pub partial: Option<ResearchResult>,
}

#[cfg(test)]
mod tests {
    use std::collections::{HashSet, VecDeque};
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    use super::*;
    use crate::schema::{AxisScores, DesignSpec, FailurePolicy, ScoreCard};
    use crate::search::{ReportError, fitness};

    fn config(population_size: usize, max_generations: usize) -> ResearchConfig {
        ResearchConfig {
            population_size,
            max_generations,
            max_duration: Duration::from_secs(3600),
            ..Default::default()
        }
    }

    fn drafts(n: usize) -> Vec<DesignDraft> {
        (0..n)
            .map(|i| DesignDraft::new(format!("Concept {i}"), "", DesignSpec::default()))
            .collect()
    }

    fn full(usability: f64) -> ScoreCard {
        ScoreCard::new(AxisScores::full(usability, 5.0, 5.0, 5.0))
    }

    /// Generator that fills the requested population and records requests.
    #[derive(Clone, Default)]
    struct FillGenerator {
        requests: Arc<Mutex<Vec<GenerationRequest>>>,
        failures: Arc<Mutex<VecDeque<Option<CapabilityError>>>>,
        exhaust_at: Option<usize>,
    }

    impl FillGenerator {
        fn failing(script: Vec<Option<CapabilityError>>) -> Self {
            Self {
                failures: Arc::new(Mutex::new(script.into())),
                ..Default::default()
            }
        }

        fn calls(&self) -> usize {
            self.requests.lock().unwrap().len()
        }
    }

    impl CandidateGenerator for FillGenerator {
        fn generate(
            &mut self,
            request: &GenerationRequest,
            _cancel: &CancelToken,
        ) -> Result<Vec<DesignDraft>, CapabilityError> {
            self.requests.lock().unwrap().push(request.clone());
            if let Some(Some(err)) = self.failures.lock().unwrap().pop_front() {
                return Err(err);
            }
            if self.exhaust_at == Some(request.generation) {
                return Ok(Vec::new());
            }
            Ok(drafts(request.population_size))
        }
    }

    /// Evaluator scoring usability from a per-id function.
    #[derive(Clone)]
    struct ScriptedEvaluator {
        calls: Arc<Mutex<usize>>,
        failures: Arc<Mutex<VecDeque<Option<CapabilityError>>>>,
        score: fn(&str) -> Option<ScoreCard>,
    }

    impl ScriptedEvaluator {
        fn new(score: fn(&str) -> Option<ScoreCard>) -> Self {
            Self {
                calls: Arc::new(Mutex::new(0)),
                failures: Arc::new(Mutex::new(VecDeque::new())),
                score,
            }
        }

        fn failing(mut self, script: Vec<Option<CapabilityError>>) -> Self {
            self.failures = Arc::new(Mutex::new(script.into()));
            self
        }

        fn calls(&self) -> usize {
            *self.calls.lock().unwrap()
        }
    }

    impl CandidateEvaluator for ScriptedEvaluator {
        fn score(
            &mut self,
            batch: &[Candidate],
            _brief: &ResearchBrief,
            _cancel: &CancelToken,
        ) -> Result<ScoreSheet, CapabilityError> {
            *self.calls.lock().unwrap() += 1;
            if let Some(Some(err)) = self.failures.lock().unwrap().pop_front() {
                return Err(err);
            }
            Ok(batch
                .iter()
                .filter_map(|c| (self.score)(c.id()).map(|card| (c.id().to_string(), card)))
                .collect())
        }
    }

    fn score_all(_id: &str) -> Option<ScoreCard> {
        Some(full(5.0))
    }

    fn unavailable() -> CapabilityError {
        CapabilityError::Unavailable("provider down".to_string())
    }

    #[test]
    fn test_single_generation_scenario() {
        let evaluator = ScriptedEvaluator::new(|id| {
            (id == "0-001").then(|| ScoreCard::new(AxisScores::full(8.0, 7.0, 6.0, 2.0)))
        });
        let mut engine = ResearchEngine::new(config(3, 1), FillGenerator::default(), evaluator);

        let result = engine.run().unwrap();

        let ids: Vec<&str> = result.all_candidates().iter().map(|c| c.id()).collect();
        assert_eq!(ids, vec!["0-000", "0-001", "0-002"]);
        let best = result.best_candidate().unwrap();
        assert_eq!(best.id(), "0-001");
        assert!((best.fitness().unwrap() - 5.75).abs() < 1e-9);
        assert!(result.candidate("0-000").unwrap().is_unscored());
        assert!(result.candidate("0-002").unwrap().is_unscored());
        assert_eq!(result.status(), RunStatus::Completed);
        assert_eq!(result.stop_reason(), Some(&StopReason::MaxGenerations));
        assert_eq!(result.generations_completed(), 1);
        assert!(result.completed_at().is_some());
    }

    #[test]
    fn test_exhausted_generator_stops_gracefully() {
        let generator = FillGenerator {
            exhaust_at: Some(2),
            ..Default::default()
        };
        let mut engine =
            ResearchEngine::new(config(3, 5), generator.clone(), ScriptedEvaluator::new(score_all));

        let result = engine.run().unwrap();

        assert_eq!(result.status(), RunStatus::Completed);
        assert_eq!(result.stop_reason(), Some(&StopReason::Exhausted));
        assert_eq!(result.generations_completed(), 2);
        assert_eq!(result.all_candidates().len(), 6);
        assert!(result.all_candidates().iter().all(|c| c.generation < 2));
        assert_eq!(generator.calls(), 3);
    }

    #[test]
    fn test_unknown_ids_dropped() {
        let evaluator = |batch: &[Candidate],
                         _brief: &ResearchBrief,
                         _cancel: &CancelToken|
         -> Result<ScoreSheet, CapabilityError> {
            let mut sheet: ScoreSheet = batch
                .iter()
                .map(|c| (c.id().to_string(), full(6.0)))
                .collect();
            sheet.insert("9-999".to_string(), full(10.0));
            sheet.insert("diagnostics".to_string(), ScoreCard::default());
            Ok(sheet)
        };
        let mut engine = ResearchEngine::new(config(2, 1), FillGenerator::default(), evaluator);

        let result = engine.run().unwrap();

        assert_eq!(result.all_candidates().len(), 2);
        assert!(result.candidate("9-999").is_none());
        for candidate in result.all_candidates() {
            assert_eq!(candidate.evaluation().unwrap().scores().usability, Some(6.0));
        }
    }

    #[test]
    fn test_ids_unique_across_generations() {
        let mut engine =
            ResearchEngine::new(config(5, 4), FillGenerator::default(), ScriptedEvaluator::new(score_all));

        let result = engine.run().unwrap();

        let ids: HashSet<&str> = result.all_candidates().iter().map(|c| c.id()).collect();
        assert_eq!(ids.len(), 20);
        assert!(ids.contains("3-004"));
        assert_eq!(result.generations_completed(), 4);
    }

    #[test]
    fn test_oversized_batch_truncated() {
        let generator = |_request: &GenerationRequest,
                         _cancel: &CancelToken|
         -> Result<Vec<DesignDraft>, CapabilityError> { Ok(drafts(5)) };
        let mut engine = ResearchEngine::new(config(3, 1), generator, ScriptedEvaluator::new(score_all));

        let result = engine.run().unwrap();

        let ids: Vec<&str> = result.all_candidates().iter().map(|c| c.id()).collect();
        assert_eq!(ids, vec!["0-000", "0-001", "0-002"]);
    }

    #[test]
    fn test_tie_keeps_earliest_candidate() {
        let mut engine =
            ResearchEngine::new(config(3, 3), FillGenerator::default(), ScriptedEvaluator::new(score_all));

        let result = engine.run().unwrap();

        assert_eq!(result.best_candidate().unwrap().id(), "0-000");
    }

    #[test]
    fn test_best_is_argmax_over_scored() {
        let evaluator = ScriptedEvaluator::new(|id| match id {
            "1-002" => Some(full(9.0)),
            // Higher raw usability but missing axes: never best.
            "1-001" => Some(ScoreCard::new(AxisScores {
                usability: Some(100.0),
                ..Default::default()
            })),
            "2-000" => Some(full(9.0)),
            _ => Some(full(1.0)),
        });
        let mut engine = ResearchEngine::new(config(3, 3), FillGenerator::default(), evaluator);

        let result = engine.run().unwrap();

        let best = result.best_candidate().unwrap();
        assert_eq!(best.id(), "1-002");
        let max = result
            .all_candidates()
            .iter()
            .filter(|c| c.is_rankable())
            .filter_map(Candidate::fitness)
            .fold(f64::NEG_INFINITY, f64::max);
        assert_eq!(best.fitness(), Some(max));
        assert!(result.candidate("1-001").unwrap().fitness().unwrap() > max);
    }

    #[test]
    fn test_no_scores_means_no_best() {
        let mut engine =
            ResearchEngine::new(config(2, 2), FillGenerator::default(), ScriptedEvaluator::new(|_| None));

        let result = engine.run().unwrap();

        assert!(result.best_candidate().is_none());
        assert_eq!(result.all_candidates().len(), 4);
        assert!(result.history().iter().all(|s| s.scored == 0 && s.mean_fitness.is_none()));
    }

    #[test]
    fn test_generator_failure_preserves_partial_result() {
        let generator = FillGenerator::failing(vec![None, Some(unavailable())]);
        let mut engine = ResearchEngine::new(config(2, 5), generator, ScriptedEvaluator::new(score_all));

        let failure = engine.run().unwrap_err();

        assert!(matches!(
            failure.error,
            ResearchError::Generation { generation: 1, .. }
        ));
        let partial = failure.partial.unwrap();
        assert_eq!(partial.status(), RunStatus::Failed);
        assert!(partial.completed_at().is_none());
        assert_eq!(partial.all_candidates().len(), 2);
        assert_eq!(partial.best_candidate().unwrap().id(), "0-000");
    }

    #[test]
    fn test_retry_recovers_without_duplicates() {
        let generator = FillGenerator::failing(vec![Some(unavailable())]);
        let evaluator = ScriptedEvaluator::new(score_all).failing(vec![Some(unavailable())]);
        let config = ResearchConfig {
            failure_policy: FailurePolicy {
                retry_failed_step: true,
                ..Default::default()
            },
            ..config(3, 1)
        };
        let mut engine = ResearchEngine::new(config, generator.clone(), evaluator.clone());

        let result = engine.run().unwrap();

        assert_eq!(generator.calls(), 2);
        assert_eq!(evaluator.calls(), 2);
        assert_eq!(result.all_candidates().len(), 3);
        assert!(result.all_candidates().iter().all(Candidate::is_rankable));
    }

    #[test]
    fn test_retry_only_once() {
        let evaluator = ScriptedEvaluator::new(score_all)
            .failing(vec![Some(unavailable()), Some(unavailable()), None]);
        let config = ResearchConfig {
            failure_policy: FailurePolicy {
                retry_failed_step: true,
                ..Default::default()
            },
            ..config(2, 3)
        };
        let mut engine = ResearchEngine::new(config, FillGenerator::default(), evaluator.clone());

        let failure = engine.run().unwrap_err();

        assert_eq!(evaluator.calls(), 2);
        assert!(matches!(
            failure.error,
            ResearchError::Evaluation { generation: 0, .. }
        ));
        // Registered candidates survive as unscored entries.
        let partial = failure.partial.unwrap();
        assert_eq!(partial.all_candidates().len(), 2);
        assert!(partial.all_candidates().iter().all(Candidate::is_unscored));
    }

    #[test]
    fn test_no_retry_by_default() {
        let generator = FillGenerator::failing(vec![Some(unavailable())]);
        let mut engine =
            ResearchEngine::new(config(2, 2), generator.clone(), ScriptedEvaluator::new(score_all));

        assert!(engine.run().is_err());
        assert_eq!(generator.calls(), 1);
    }

    #[test]
    fn test_keep_partial_on_failure() {
        let evaluator = ScriptedEvaluator::new(score_all).failing(vec![None, Some(unavailable())]);
        let config = ResearchConfig {
            failure_policy: FailurePolicy {
                keep_partial_on_failure: true,
                ..Default::default()
            },
            ..config(2, 4)
        };
        let mut engine = ResearchEngine::new(config.clone(), FillGenerator::default(), evaluator);

        let result = engine.run().unwrap();

        assert_eq!(result.status(), RunStatus::Completed);
        assert!(matches!(
            result.stop_reason(),
            Some(StopReason::CapabilityFailed(_))
        ));
        assert_eq!(result.generations_completed(), 1);

        // Nothing completed yet: still a failure.
        let generator = FillGenerator::failing(vec![Some(unavailable())]);
        let mut engine = ResearchEngine::new(config, generator, ScriptedEvaluator::new(score_all));
        assert!(engine.run().is_err());
    }

    #[test]
    fn test_invalid_config_fails_before_generation() {
        let generator = FillGenerator::default();
        let mut engine =
            ResearchEngine::new(config(0, 1), generator.clone(), ScriptedEvaluator::new(score_all));

        let failure = engine.run().unwrap_err();

        assert!(matches!(
            failure.error,
            ResearchError::Configuration(ConfigError::InvalidPopulationSize)
        ));
        assert!(failure.partial.is_none());
        assert_eq!(generator.calls(), 0);
    }

    #[test]
    fn test_cancel_before_run() {
        let generator = FillGenerator::default();
        let mut engine =
            ResearchEngine::new(config(2, 5), generator.clone(), ScriptedEvaluator::new(score_all));
        engine.cancel_handle().cancel();

        let result = engine.run().unwrap();

        assert_eq!(result.status(), RunStatus::Cancelled);
        assert_eq!(result.stop_reason(), Some(&StopReason::Cancelled));
        assert!(result.all_candidates().is_empty());
        assert_eq!(generator.calls(), 0);
    }

    #[test]
    fn test_cancel_at_generation_boundary() {
        let token = CancelToken::new();
        let trigger = token.clone();
        let evaluator = move |batch: &[Candidate],
                              _brief: &ResearchBrief,
                              _cancel: &CancelToken|
              -> Result<ScoreSheet, CapabilityError> {
            trigger.cancel();
            Ok(batch
                .iter()
                .map(|c| (c.id().to_string(), full(5.0)))
                .collect())
        };
        let mut engine = ResearchEngine::new(config(2, 10), FillGenerator::default(), evaluator)
            .with_cancel_token(token);

        let result = engine.run().unwrap();

        assert_eq!(result.status(), RunStatus::Cancelled);
        assert_eq!(result.generations_completed(), 1);
        assert_eq!(result.all_candidates().len(), 2);
        assert!(result.completed_at().is_some());
    }

    #[test]
    fn test_capability_cancelled_error() {
        let evaluator =
            ScriptedEvaluator::new(score_all).failing(vec![Some(CapabilityError::Cancelled)]);
        let config = ResearchConfig {
            failure_policy: FailurePolicy {
                retry_failed_step: true,
                ..Default::default()
            },
            ..config(2, 3)
        };
        let mut engine = ResearchEngine::new(config, FillGenerator::default(), evaluator.clone());

        let result = engine.run().unwrap();

        assert_eq!(result.status(), RunStatus::Cancelled);
        assert_eq!(evaluator.calls(), 1);
    }

    #[test]
    fn test_deadline_stops_after_current_generation() {
        let generator = |request: &GenerationRequest,
                         _cancel: &CancelToken|
         -> Result<Vec<DesignDraft>, CapabilityError> {
            std::thread::sleep(Duration::from_millis(30));
            Ok(drafts(request.population_size))
        };
        let config = ResearchConfig {
            max_duration: Duration::from_millis(10),
            ..config(2, 100)
        };
        let mut engine = ResearchEngine::new(config, generator, ScriptedEvaluator::new(score_all));

        let result = engine.run().unwrap();

        assert_eq!(result.stop_reason(), Some(&StopReason::Deadline));
        assert_eq!(result.generations_completed(), 1);
        assert_eq!(result.all_candidates().len(), 2);
    }

    #[test]
    fn test_survivors_passed_to_generator() {
        let generator = FillGenerator::default();
        let evaluator = ScriptedEvaluator::new(|id| match id {
            "0-002" => Some(full(9.0)),
            "0-001" => Some(full(7.0)),
            _ => Some(full(1.0)),
        });
        let config = ResearchConfig {
            survivor_digest_size: 2,
            ..config(3, 2)
        };
        let mut engine = ResearchEngine::new(config, generator.clone(), evaluator);

        engine.run().unwrap();

        let requests = generator.requests.lock().unwrap();
        assert_eq!(requests.len(), 2);
        assert!(requests[0].survivors.is_empty());
        let survivor_ids: Vec<&str> = requests[1].survivors.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(survivor_ids, vec!["0-002", "0-001"]);
        assert_eq!(requests[1].generation, 1);
        assert!(requests[1].remaining <= Duration::from_secs(3600));
    }

    #[derive(Clone, Default)]
    struct RecordingReporter {
        published: Arc<Mutex<Vec<String>>>,
    }

    impl RunReporter for RecordingReporter {
        fn publish(
            &mut self,
            result: &ResearchResult,
        ) -> Result<PublishReceipt, ReportError> {
            self.published.lock().unwrap().push(result.job_id().to_string());
            Ok(PublishReceipt {
                bundle_dir: result.job_id().into(),
                index_path: "index.html".into(),
            })
        }
    }

    #[test]
    fn test_reporter_called_once_on_completion() {
        let reporter = RecordingReporter::default();
        let mut engine =
            ResearchEngine::new(config(2, 2), FillGenerator::default(), ScriptedEvaluator::new(score_all))
                .with_reporter(reporter.clone());

        let result = engine.run().unwrap();

        assert_eq!(*reporter.published.lock().unwrap(), vec![result.job_id().to_string()]);
        assert_eq!(
            engine.publication().unwrap().bundle_dir,
            std::path::PathBuf::from(result.job_id())
        );
    }

    #[test]
    fn test_reporter_skipped_on_failure() {
        let reporter = RecordingReporter::default();
        let generator = FillGenerator::failing(vec![Some(unavailable())]);
        let mut engine = ResearchEngine::new(config(2, 2), generator, ScriptedEvaluator::new(score_all))
            .with_reporter(reporter.clone());

        assert!(engine.run().is_err());
        assert!(reporter.published.lock().unwrap().is_empty());
        assert!(engine.publication().is_none());
    }

    #[test]
    fn test_progress_phases() {
        let mut phases = Vec::new();
        let mut engine =
            ResearchEngine::new(config(1, 2), FillGenerator::default(), ScriptedEvaluator::new(score_all));

        engine
            .run_with_callback(|progress| phases.push((progress.generation, progress.phase)))
            .unwrap();

        use ResearchPhase::*;
        assert_eq!(
            phases,
            vec![
                (0, Initializing),
                (0, Generating),
                (0, Evaluating),
                (0, Selecting),
                (1, Generating),
                (1, Evaluating),
                (1, Selecting),
                (1, Terminated),
            ]
        );
    }

    #[test]
    fn test_nan_fitness_excluded_from_summary() {
        let evaluator = ScriptedEvaluator::new(|id| {
            if id == "0-000" {
                Some(ScoreCard::new(AxisScores::full(f64::NAN, 5.0, 5.0, 5.0)))
            } else {
                Some(full(6.0))
            }
        });
        let mut engine = ResearchEngine::new(config(2, 1), FillGenerator::default(), evaluator);

        let result = engine.run().unwrap();

        let summary = &result.history()[0];
        assert_eq!(summary.produced, 2);
        assert_eq!(summary.scored, 1);
        let expected = fitness(&full(6.0).scores);
        assert_eq!(summary.generation_best, Some(expected));
        assert_eq!(summary.mean_fitness, Some(expected));
        assert_eq!(result.best_candidate().unwrap().id(), "0-001");
    }

    #[test]
    fn test_blank_score_card_leaves_candidate_unscored() {
        let evaluator = ScriptedEvaluator::new(|_| Some(ScoreCard::default()));
        let mut engine = ResearchEngine::new(config(2, 2), FillGenerator::default(), evaluator);

        let result = engine.run().unwrap();

        assert_eq!(result.all_candidates().len(), 4);
        assert!(result.all_candidates().iter().all(Candidate::is_unscored));
        assert!(result.best_candidate().is_none());
        assert!(result.ranked().is_empty());
        assert!(result.history().iter().all(|s| s.scored == 0 && s.mean_fitness.is_none()));
    }
}
