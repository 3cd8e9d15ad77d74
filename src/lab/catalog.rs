//! Offline design generator that samples concepts from pattern catalogs.
//!
//! Each spec field is drawn from a fixed catalog. When the engine forwards
//! survivors from earlier generations, fields are inherited from them with a
//! configurable probability, so later generations drift toward what scored well.

use rand::prelude::*;

use crate::schema::{DesignDraft, DesignSpec};
use crate::search::{
    CancelToken, CandidateGenerator, CapabilityError, GenerationRequest, SurvivorDigest,
};

const LAYOUTS: &[&str] = &[
    "single-column wizard",
    "card grid dashboard",
    "split-pane master/detail",
    "masonry gallery",
    "progressive disclosure checklist",
    "hero-led landing with sections",
    "timeline feed",
];

const NAVIGATION: &[&str] = &[
    "bottom nav with 4 tabs",
    "top tabs",
    "hamburger drawer",
    "persistent sidebar",
    "breadcrumb stepper",
    "floating action hub",
];

const PALETTES: &[&str] = &[
    "Indigo 600, Slate 50, Emerald 500, Amber 400",
    "Monochrome grays, Teal 500",
    "Warm sand, Terracotta, Deep navy, Off-white",
    "High contrast black, White, Electric blue",
    "Lavender, Mint, Peach, Cream, Slate, Rose, Sky, Lemon",
];

const TYPOGRAPHY: &[&str] = &[
    "Display / H1 / Body / Caption",
    "Display / H1 / H2 / Body / Caption",
    "H1 / Body",
    "Display / H1 / H2 / H3 / H4 / Body / Small / Caption",
];

const COMPONENT_STYLES: &[&str] = &[
    "Material-ish",
    "Minimal flat",
    "Neumorphic",
    "Glassmorphism",
    "Custom illustrated",
    "Utility-first components",
];

const INTERACTIONS: &[&str] = &[
    "Subtle fade transitions and inline validation",
    "Parallax hero and animated counters",
    "Swipe gestures with undo snackbar",
    "Drag-and-drop reordering with spring animation",
    "3D card flips on selection",
    "Instant feedback with skeleton loaders",
];

const ACCESSIBILITY: &[&str] = &[
    "WCAG AA contrast, visible focus rings, screen reader labels",
    "Reduced motion support and 44px touch targets",
    "Keyboard navigable with skip links and logical focus order",
    "Color-blind safe palette with icon redundancy",
    "Status conveyed by color alone",
];

/// Seeded generator composing design specs from fixed catalogs.
pub struct CatalogGenerator {
    rng: StdRng,
    seed: u64,
    inherit_rate: f64,
    remaining: Option<usize>,
}

impl CatalogGenerator {
    /// Create from seed.
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            seed,
            inherit_rate: 0.5,
            remaining: None,
        }
    }

    /// Create with random seed.
    pub fn random() -> Self {
        Self::new(rand::random())
    }

    /// Probability (0.0-1.0) that a field is copied from a survivor.
    pub fn with_inherit_rate(mut self, rate: f64) -> Self {
        self.inherit_rate = if rate.is_nan() {
            0.0
        } else {
            rate.clamp(0.0, 1.0)
        };
        self
    }

    /// Stop producing after `limit` drafts in total.
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.remaining = Some(limit);
        self
    }

    fn draft(&mut self, request: &GenerationRequest, position: usize) -> DesignDraft {
        let spec = DesignSpec {
            layout_pattern: self.field(LAYOUTS, &request.survivors, |s| &s.layout_pattern),
            navigation_pattern: self.field(NAVIGATION, &request.survivors, |s| {
                &s.navigation_pattern
            }),
            color_palette: self.field(PALETTES, &request.survivors, |s| &s.color_palette),
            typography_scale: self.field(TYPOGRAPHY, &request.survivors, |s| {
                &s.typography_scale
            }),
            component_library_style: self.field(COMPONENT_STYLES, &request.survivors, |s| {
                &s.component_library_style
            }),
            interaction_notes: self.field(INTERACTIONS, &request.survivors, |s| {
                &s.interaction_notes
            }),
            accessibility_notes: self.field(ACCESSIBILITY, &request.survivors, |s| {
                &s.accessibility_notes
            }),
        };

        let name = format!(
            "{} / {}",
            capitalize(&spec.layout_pattern),
            spec.navigation_pattern
        );
        let summary = format!(
            "A {} {} concept for {} with {} components.",
            request.brief.brand_tone,
            spec.layout_pattern,
            request.brief.target_platform,
            spec.component_library_style.to_lowercase()
        );

        DesignDraft {
            name,
            summary,
            spec,
            source_prompt: Some(format!(
                "catalog seed {} generation {} draft {} ({} survivors)",
                self.seed,
                request.generation,
                position,
                request.survivors.len()
            )),
        }
    }

    /// Pick a field value, inheriting from a survivor when one is drawn.
    fn field(
        &mut self,
        catalog: &[&str],
        survivors: &[SurvivorDigest],
        get: impl Fn(&DesignSpec) -> &String,
    ) -> String {
        if !survivors.is_empty() && self.rng.gen_bool(self.inherit_rate) {
            // Bias toward the front of the list (best survivors first).
            let a = self.rng.gen_range(0..survivors.len());
            let b = self.rng.gen_range(0..survivors.len());
            return get(&survivors[a.min(b)].spec).clone();
        }
        catalog
            .choose(&mut self.rng)
            .map(|s| s.to_string())
            .unwrap_or_default()
    }
}

impl CandidateGenerator for CatalogGenerator {
    fn generate(
        &mut self,
        request: &GenerationRequest,
        cancel: &CancelToken,
    ) -> Result<Vec<DesignDraft>, CapabilityError> {
        let count = match self.remaining {
            Some(remaining) => request.population_size.min(remaining),
            None => request.population_size,
        };

        let mut drafts = Vec::with_capacity(count);
        for position in 0..count {
            if cancel.is_cancelled() {
                return Err(CapabilityError::Cancelled);
            }
            drafts.push(self.draft(request, position));
        }

        if let Some(remaining) = self.remaining.as_mut() {
            *remaining -= count;
        }
        Ok(drafts)
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
