//! Rule-based design evaluator.
//!
//! Scores each candidate by matching keyword rules against its spec. Batches
//! are scored in parallel; results are keyed by id so ordering does not matter.

use rayon::prelude::*;

use crate::schema::{AxisScores, Candidate, DesignSpec, ResearchBrief, ScoreCard};
use crate::search::{CancelToken, CandidateEvaluator, CapabilityError, ScoreSheet};

/// A keyword and the score delta it contributes when present.
struct Rule {
    keyword: &'static str,
    delta: f64,
    note: &'static str,
}

const fn rule(keyword: &'static str, delta: f64, note: &'static str) -> Rule {
    Rule {
        keyword,
        delta,
        note,
    }
}

const USABILITY_LAYOUT: &[Rule] = &[
    rule("wizard", 1.0, "guided flow"),
    rule("single-column", 0.5, "linear reading order"),
    rule("progressive disclosure", 1.0, "progressive disclosure"),
    rule("masonry", -1.0, "unpredictable scanning"),
];

const USABILITY_INTERACTION: &[Rule] = &[
    rule("undo", 1.0, "undo support"),
    rule("inline validation", 1.0, "inline validation"),
    rule("instant feedback", 0.5, "immediate feedback"),
    rule("3d", -1.0, "disorienting 3D motion"),
];

const ACCESSIBILITY_RULES: &[Rule] = &[
    rule("contrast", 2.0, "contrast addressed"),
    rule("focus", 1.5, "focus handling"),
    rule("screen reader", 1.5, "screen reader labels"),
    rule("reduced motion", 1.0, "reduced motion"),
    rule("touch target", 1.0, "touch targets"),
    rule("44px", 1.0, "44px targets"),
    rule("keyboard", 1.5, "keyboard navigation"),
    rule("color-blind", 1.5, "color-blind safe"),
    rule("color alone", -2.5, "color-only status"),
];

const CLARITY_STYLE: &[Rule] = &[
    rule("minimal", 1.0, "minimal styling"),
    rule("material", 0.5, "familiar components"),
    rule("glass", -0.5, "translucent layers"),
    rule("neumorphic", -1.0, "low-contrast surfaces"),
];

const COMPLEXITY_RULES: &[Rule] = &[
    rule("parallax", 2.0, "parallax"),
    rule("3d", 2.5, "3D transforms"),
    rule("animat", 1.0, "custom animation"),
    rule("gesture", 1.0, "gesture handling"),
    rule("drag", 1.5, "drag and drop"),
    rule("custom", 2.0, "custom components"),
    rule("neumorphic", 1.5, "bespoke shadows"),
    rule("glass", 1.5, "backdrop effects"),
    rule("masonry", 1.0, "masonry layout"),
    rule("material", -1.0, "off-the-shelf kit"),
    rule("utility", -0.5, "utility classes"),
];

/// Evaluator applying keyword rules to each spec.
#[derive(Debug, Clone, Default)]
pub struct HeuristicEvaluator {
    /// Include the triggered rules as the rationale.
    pub explain: bool,
}

impl HeuristicEvaluator {
    pub fn new(explain: bool) -> Self {
        Self { explain }
    }

    /// Score a single spec against the brief.
    pub fn score_spec(&self, spec: &DesignSpec, brief: &ResearchBrief) -> ScoreCard {
        let mut notes = Vec::new();
        let platform = brief.target_platform.to_lowercase();
        let mobile = platform.contains("mobile");

        // Usability
        let mut usability = 5.0;
        let nav = spec.navigation_pattern.to_lowercase();
        if nav.contains("bottom") && mobile {
            usability += 2.0;
        } else if nav.contains("sidebar") && !mobile {
            usability += 1.5;
        } else if nav.contains("tabs") {
            usability += 1.0;
        } else if nav.contains("hamburger") {
            usability -= 1.0;
            notes.push("hidden navigation");
        }
        usability += apply(USABILITY_LAYOUT, &spec.layout_pattern, &mut notes);
        usability += apply(USABILITY_INTERACTION, &spec.interaction_notes, &mut notes);
        if spec.layout_pattern.to_lowercase().contains("dashboard") {
            usability += if mobile { -0.5 } else { 0.5 };
        }

        // Accessibility
        let mut accessibility = 3.0;
        accessibility += apply(ACCESSIBILITY_RULES, &spec.accessibility_notes, &mut notes);
        if spec.color_palette.to_lowercase().contains("high contrast") {
            accessibility += 1.0;
            notes.push("high contrast palette");
        }

        // Visual clarity
        let mut visual_clarity = 5.0;
        visual_clarity += match count_parts(&spec.typography_scale, '/') {
            3..=5 => 2.0,
            0..=2 => 0.0,
            _ => -1.0,
        };
        visual_clarity += match count_parts(&spec.color_palette, ',') {
            2..=5 => 1.5,
            0 | 1 => 0.0,
            _ => -1.0,
        };
        visual_clarity += apply(CLARITY_STYLE, &spec.component_library_style, &mut notes);

        // Implementation complexity
        let mut complexity = 3.0;
        complexity += apply(COMPLEXITY_RULES, &spec.interaction_notes, &mut notes);
        complexity += apply(COMPLEXITY_RULES, &spec.component_library_style, &mut notes);
        complexity += apply(COMPLEXITY_RULES, &spec.layout_pattern, &mut notes);

        let scores = AxisScores::full(
            clamp_score(usability),
            clamp_score(accessibility),
            clamp_score(visual_clarity),
            clamp_score(complexity),
        );

        let card = ScoreCard::new(scores);
        if self.explain && !notes.is_empty() {
            card.with_rationale(notes.join("; "))
        } else {
            card
        }
    }
}

impl CandidateEvaluator for HeuristicEvaluator {
    fn score(
        &mut self,
        batch: &[Candidate],
        brief: &ResearchBrief,
        cancel: &CancelToken,
    ) -> Result<ScoreSheet, CapabilityError> {
        if cancel.is_cancelled() {
            return Err(CapabilityError::Cancelled);
        }

        let evaluator = &*self;
        let sheet: ScoreSheet = batch
            .par_iter()
            .filter(|_| !cancel.is_cancelled())
            .map(|c| (c.id().to_string(), evaluator.score_spec(&c.spec, brief)))
            .collect();

        if cancel.is_cancelled() {
            return Err(CapabilityError::Cancelled);
        }
        Ok(sheet)
    }
}

/// Sum the deltas of all rules whose keyword appears in `text`.
fn apply(rules: &[Rule], text: &str, notes: &mut Vec<&'static str>) -> f64 {
    let text = text.to_lowercase();
    rules
        .iter()
        .filter(|r| text.contains(r.keyword))
        .map(|r| {
            notes.push(r.note);
            r.delta
        })
        .sum()
}

fn count_parts(text: &str, separator: char) -> usize {
    text.split(separator).filter(|p| !p.trim().is_empty()).count()
}

fn clamp_score(value: f64) -> f64 {
    value.clamp(0.0, 10.0)
}
