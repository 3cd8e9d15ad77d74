//! Fitness model for ranking design candidates.
//!
//! Combines the four evaluator axes into a single scalar with fixed weights.
//! The function is total: out-of-range, negative, and missing values never
//! cause a failure. Missing axes contribute nothing.

use crate::schema::AxisScores;

/// Weight applied to usability.
pub const USABILITY_WEIGHT: f64 = 0.35;
/// Weight applied to accessibility.
pub const ACCESSIBILITY_WEIGHT: f64 = 0.25;
/// Weight applied to visual clarity.
pub const VISUAL_CLARITY_WEIGHT: f64 = 0.25;
/// Penalty weight applied to implementation complexity.
pub const COMPLEXITY_PENALTY: f64 = 0.15;

/// Compute the ranking scalar for a set of raw scores.
pub fn fitness(scores: &AxisScores) -> f64 {
    let axis = |value: Option<f64>| value.unwrap_or(0.0);

    axis(scores.usability) * USABILITY_WEIGHT
        + axis(scores.accessibility) * ACCESSIBILITY_WEIGHT
        + axis(scores.visual_clarity) * VISUAL_CLARITY_WEIGHT
        - axis(scores.implementation_complexity) * COMPLEXITY_PENALTY
}
