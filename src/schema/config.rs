//! Configuration types for research runs.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::ResearchBrief;

/// Configuration for a single research run.
///
/// The engine takes ownership of this value at construction and only hands out
/// shared references, so it cannot change once a run starts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResearchConfig {
    /// What product, screen, or flow is being designed.
    pub problem_statement: String,
    /// Target platform, e.g. "mobile", "desktop", "responsive".
    pub target_platform: String,
    /// Brand tone, e.g. "playful", "calm", "enterprise".
    pub brand_tone: String,
    /// Candidates requested per generation.
    #[serde(default = "default_population_size")]
    pub population_size: usize,
    /// Hard cap on loop iterations.
    #[serde(default = "default_max_generations")]
    pub max_generations: usize,
    /// Wall-clock budget for the whole run.
    #[serde(
        rename = "max_duration_secs",
        with = "duration_secs",
        default = "default_max_duration"
    )]
    pub max_duration: Duration,
    /// How capability failures are handled.
    #[serde(default)]
    pub failure_policy: FailurePolicy,
    /// Number of top survivors forwarded to the generator (0 disables).
    #[serde(default = "default_survivor_digest_size")]
    pub survivor_digest_size: usize,
}

impl Default for ResearchConfig {
    fn default() -> Self {
        Self {
            problem_statement: "Onboarding flow for a personal budgeting app".to_string(),
            target_platform: "mobile".to_string(),
            brand_tone: "calm".to_string(),
            population_size: default_population_size(),
            max_generations: default_max_generations(),
            max_duration: default_max_duration(),
            failure_policy: FailurePolicy::default(),
            survivor_digest_size: default_survivor_digest_size(),
        }
    }
}

fn default_population_size() -> usize {
    20
}
fn default_max_generations() -> usize {
    10
}
fn default_max_duration() -> Duration {
    Duration::from_secs(8 * 60 * 60)
}
fn default_survivor_digest_size() -> usize {
    3
}

/// Retry and partial-result policy for generator/evaluator failures.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct FailurePolicy {
    /// Retry a failed generate/score step once before surfacing the failure.
    #[serde(default)]
    pub retry_failed_step: bool,
    /// Stop gracefully (instead of failing) when a step fails after at least
    /// one generation has completed.
    #[serde(default)]
    pub keep_partial_on_failure: bool,
}

impl ResearchConfig {
    /// The context strings forwarded to capabilities.
    pub fn brief(&self) -> ResearchBrief {
        ResearchBrief {
            problem_statement: self.problem_statement.clone(),
            target_platform: self.target_platform.clone(),
            brand_tone: self.brand_tone.clone(),
        }
    }

    /// Validate configuration parameters.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.population_size == 0 {
            return Err(ConfigError::InvalidPopulationSize);
        }
        if self.max_generations == 0 {
            return Err(ConfigError::InvalidMaxGenerations);
        }
        if self.max_duration.is_zero() {
            return Err(ConfigError::InvalidMaxDuration);
        }
        Ok(())
    }
}

/// Configuration for the `uiux-lab` binary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LabConfig {
    /// The research run itself.
    pub research: ResearchConfig,
    /// Directory research bundles are written under.
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
    /// Seed for the design catalog sampler (random when absent).
    #[serde(default)]
    pub random_seed: Option<u64>,
}

impl Default for LabConfig {
    fn default() -> Self {
        Self {
            research: ResearchConfig::default(),
            output_dir: default_output_dir(),
            random_seed: Some(42),
        }
    }
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("Output")
}

impl LabConfig {
    /// Validate configuration parameters.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.output_dir.as_os_str().is_empty() {
            return Err(ConfigError::MissingOutputDir);
        }
        self.research.validate()
    }
}

/// Configuration validation errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("Population size must be at least 1")]
    InvalidPopulationSize,
    #[error("Max generations must be at least 1")]
    InvalidMaxGenerations,
    #[error("Max duration must be positive")]
    InvalidMaxDuration,
    #[error("Output directory must not be empty")]
    MissingOutputDir,
}

/// Serde adapter storing a `Duration` as fractional seconds.
mod duration_secs {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer, de::Error};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(value.as_secs_f64())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let secs = f64::deserialize(deserializer)?;
        Duration::try_from_secs_f64(secs).map_err(D::Error::custom)
    }
}
