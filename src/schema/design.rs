//! Design concept types: specs, drafts, scores, and candidates.

use serde::{Deserialize, Serialize};

use crate::search::fitness;

/// Context strings forwarded to generators and evaluators.
///
/// The engine never interprets these.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ResearchBrief {
    pub problem_statement: String,
    pub target_platform: String,
    pub brand_tone: String,
}

/// Structured description of a UI/UX concept.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct DesignSpec {
    /// e.g. "single-column wizard".
    pub layout_pattern: String,
    /// e.g. "bottom nav", "tabs".
    pub navigation_pattern: String,
    /// Color tokens or a palette description.
    pub color_palette: String,
    /// e.g. "Display / H1 / body / caption".
    pub typography_scale: String,
    /// e.g. "Material-ish", "Neumorphic".
    pub component_library_style: String,
    /// Micro-interactions and transitions.
    pub interaction_notes: String,
    /// Contrast, focus states, and similar.
    pub accessibility_notes: String,
}

/// A concept as returned by a generator, before the engine assigns identity.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DesignDraft {
    pub name: String,
    pub summary: String,
    pub spec: DesignSpec,
    /// Prompt or recipe that produced this draft, kept for provenance.
    #[serde(default)]
    pub source_prompt: Option<String>,
}

impl DesignDraft {
    pub fn new(name: impl Into<String>, summary: impl Into<String>, spec: DesignSpec) -> Self {
        Self {
            name: name.into(),
            summary: summary.into(),
            spec,
            source_prompt: None,
        }
    }
}

/// Raw evaluator scores, nominally in `[0, 10]`.
///
/// `None` marks an axis the evaluator did not score.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct AxisScores {
    #[serde(default, with = "score_value")]
    pub usability: Option<f64>,
    #[serde(default, with = "score_value")]
    pub accessibility: Option<f64>,
    #[serde(default, with = "score_value")]
    pub visual_clarity: Option<f64>,
    /// Lower is better.
    #[serde(default, with = "score_value")]
    pub implementation_complexity: Option<f64>,
}

impl AxisScores {
    /// Scores with all four axes set.
    pub fn full(
        usability: f64,
        accessibility: f64,
        visual_clarity: f64,
        implementation_complexity: f64,
    ) -> Self {
        Self {
            usability: Some(usability),
            accessibility: Some(accessibility),
            visual_clarity: Some(visual_clarity),
            implementation_complexity: Some(implementation_complexity),
        }
    }

    /// All four axes are set.
    pub fn is_complete(&self) -> bool {
        self.usability.is_some()
            && self.accessibility.is_some()
            && self.visual_clarity.is_some()
            && self.implementation_complexity.is_some()
    }

    /// No axis is set.
    pub fn is_empty(&self) -> bool {
        self.usability.is_none()
            && self.accessibility.is_none()
            && self.visual_clarity.is_none()
            && self.implementation_complexity.is_none()
    }
}

/// One evaluator entry for a candidate.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ScoreCard {
    #[serde(flatten)]
    pub scores: AxisScores,
    #[serde(default)]
    pub rationale: Option<String>,
}

impl ScoreCard {
    pub fn new(scores: AxisScores) -> Self {
        Self {
            scores,
            rationale: None,
        }
    }

    pub fn with_rationale(mut self, rationale: impl Into<String>) -> Self {
        self.rationale = Some(rationale.into());
        self
    }
}

/// Immutable scored state of a candidate.
///
/// Fitness is derived from the scores on construction and on deserialization;
/// there is no way to set it directly.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(from = "ScoreCard")]
pub struct Evaluation {
    #[serde(flatten)]
    scores: AxisScores,
    rationale: Option<String>,
    #[serde(serialize_with = "score_value::serialize_plain")]
    fitness: f64,
}

impl Evaluation {
    pub fn new(card: ScoreCard) -> Self {
        Self {
            fitness: fitness(&card.scores),
            scores: card.scores,
            rationale: card.rationale,
        }
    }

    pub fn scores(&self) -> &AxisScores {
        &self.scores
    }

    pub fn rationale(&self) -> Option<&str> {
        self.rationale.as_deref()
    }

    pub fn fitness(&self) -> f64 {
        self.fitness
    }
}

impl From<ScoreCard> for Evaluation {
    fn from(card: ScoreCard) -> Self {
        Self::new(card)
    }
}

/// A design concept registered in a research run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Candidate {
    id: String,
    pub name: String,
    pub summary: String,
    pub spec: DesignSpec,
    /// Generation that produced this candidate.
    pub generation: usize,
    #[serde(default)]
    pub source_prompt: Option<String>,
    #[serde(default)]
    evaluation: Option<Evaluation>,
}

impl Candidate {
    /// Mint an id for the draft at `position` within `generation`.
    pub fn mint_id(generation: usize, position: usize) -> String {
        format!("{generation}-{position:03}")
    }

    /// Create an unscored candidate from a generator draft.
    pub fn from_draft(generation: usize, position: usize, draft: DesignDraft) -> Self {
        Self {
            id: Self::mint_id(generation, position),
            name: draft.name,
            summary: draft.summary,
            spec: draft.spec,
            generation,
            source_prompt: draft.source_prompt,
            evaluation: None,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn evaluation(&self) -> Option<&Evaluation> {
        self.evaluation.as_ref()
    }

    /// Replace the unscored state with an evaluation.
    pub fn scored(mut self, card: ScoreCard) -> Self {
        self.evaluation = Some(Evaluation::new(card));
        self
    }

    /// Fitness, if any score entry was received.
    pub fn fitness(&self) -> Option<f64> {
        self.evaluation.as_ref().map(Evaluation::fitness)
    }

    /// Whether this candidate may be ranked as best: every axis is scored.
    pub fn is_rankable(&self) -> bool {
        self.evaluation
            .as_ref()
            .is_some_and(|e| e.scores.is_complete())
    }

    /// No axis has been scored.
    pub fn is_unscored(&self) -> bool {
        self.evaluation
            .as_ref()
            .is_none_or(|e| e.scores.is_empty())
    }
}

/// Serde adapter for score values that keeps non-finite numbers.
///
/// JSON has no infinity or NaN, so those are written as the strings `"inf"`,
/// `"-inf"` and `"NaN"`. Finite values stay plain numbers.
pub(crate) mod score_value {
    use serde::{Deserialize, Deserializer, Serializer, de::Error};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(f64),
        Text(String),
    }

    pub fn serialize<S: Serializer>(
        value: &Option<f64>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match value {
            Some(v) => serialize_plain(v, serializer),
            None => serializer.serialize_none(),
        }
    }

    pub fn serialize_plain<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
        let value = *value;
        if value.is_finite() {
            serializer.serialize_f64(value)
        } else if value.is_nan() {
            serializer.serialize_str("NaN")
        } else if value > 0.0 {
            serializer.serialize_str("inf")
        } else {
            serializer.serialize_str("-inf")
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<f64>, D::Error> {
        match Option::<Raw>::deserialize(deserializer)? {
            None => Ok(None),
            Some(Raw::Number(v)) => Ok(Some(v)),
            Some(Raw::Text(text)) => match text.as_str() {
                "inf" => Ok(Some(f64::INFINITY)),
                "-inf" => Ok(Some(f64::NEG_INFINITY)),
                "NaN" => Ok(Some(f64::NAN)),
                other => Err(D::Error::custom(format!("invalid score value: {other}"))),
            },
        }
    }
}
