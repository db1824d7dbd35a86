//! Strategic placement of self-referential commentary.
//!
//! The decider is a pure function over the just-generated paragraph and the
//! run's dialectical/usage state: it scores strategic signals in the text,
//! runs one Bernoulli trial against the configured level, and returns a
//! decision. It never mutates state; the caller records the accepted
//! category into the usage tracker.

use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use rand::Rng;
use rand::rngs::SmallRng;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::constants::MAX_INSERTION_PROBABILITY;
use crate::dialectic::Stage;
use crate::usage::UsageTracker;

/// How self-aware the essay is allowed to get. Fixed for the run.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetafictionLevel {
    Subtle,
    Moderate,
    HighlySelfAware,
}

impl MetafictionLevel {
    /// Base per-paragraph insertion probability before strategic bonuses.
    pub fn base_probability(self) -> f64 {
        match self {
            MetafictionLevel::Subtle => 0.12,
            MetafictionLevel::Moderate => 0.25,
            MetafictionLevel::HighlySelfAware => 0.45,
        }
    }

    /// Probability of a metafictional concluding sentence.
    pub fn conclusion_probability(self) -> f64 {
        match self {
            MetafictionLevel::Subtle => 0.35,
            MetafictionLevel::Moderate => 0.6,
            MetafictionLevel::HighlySelfAware => 0.9,
        }
    }

    /// Hard ceiling on insertions per essay.
    pub fn max_insertions(self) -> usize {
        match self {
            MetafictionLevel::Subtle => 2,
            MetafictionLevel::Moderate => 4,
            MetafictionLevel::HighlySelfAware => 7,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            MetafictionLevel::Subtle => "subtle",
            MetafictionLevel::Moderate => "moderate",
            MetafictionLevel::HighlySelfAware => "highly_self_aware",
        }
    }
}

impl FromStr for MetafictionLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "subtle" => Ok(MetafictionLevel::Subtle),
            "moderate" => Ok(MetafictionLevel::Moderate),
            "highly_self_aware" | "high" => Ok(MetafictionLevel::HighlySelfAware),
            other => Err(format!(
                "unknown metafiction level '{other}' (expected subtle, moderate, or highly_self_aware)"
            )),
        }
    }
}

impl fmt::Display for MetafictionLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Family of self-referential commentary a template is drawn from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetafictionCategory {
    /// The text admits its entanglement in what it critiques.
    Complicity,
    /// The text turns on its own production.
    Reflexivity,
    /// The argument names its own contradiction.
    Paradox,
    /// The method is doubted mid-use.
    MethodDoubt,
    /// The reader is pulled into the frame.
    ReaderAddress,
}

impl MetafictionCategory {
    pub const ALL: [MetafictionCategory; 5] = [
        MetafictionCategory::Complicity,
        MetafictionCategory::Reflexivity,
        MetafictionCategory::Paradox,
        MetafictionCategory::MethodDoubt,
        MetafictionCategory::ReaderAddress,
    ];
}

/// The decider's verdict for one paragraph.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct InsertionDecision {
    pub insert: bool,
    pub category: Option<MetafictionCategory>,
}

impl InsertionDecision {
    pub fn skip() -> Self {
        Self {
            insert: false,
            category: None,
        }
    }
}

// Strategic-signal weights. Absolute claims invite undercutting; italicized
// concept density marks theory-heavy passages; antithesis and synthesis
// boundaries are where self-commentary lands hardest.
const ABSOLUTE_CLAIM_BONUS: f64 = 0.08;
const ABSOLUTE_CLAIM_CAP: f64 = 0.24;
const ITALIC_MARKER_BONUS: f64 = 0.05;
const ITALIC_MARKER_CAP: usize = 4;
const ANTITHESIS_BONUS: f64 = 0.10;
const SYNTHESIS_BONUS: f64 = 0.15;

static ABSOLUTE_CLAIM_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(always|never|necessarily|inevitably|essentially|undeniably|the very condition of)\b")
        .unwrap()
});

static ITALIC_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\*[^*\n]+\*").unwrap());

/// Decides whether and what kind of metafictional unit to splice into a
/// just-generated paragraph.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StrategicPlacementDecider {
    level: MetafictionLevel,
    /// Minimum paragraphs between insertions.
    min_spacing: usize,
    /// How many recent categories to avoid when picking the next one.
    recent_window: usize,
}

impl StrategicPlacementDecider {
    pub fn new(level: MetafictionLevel, min_spacing: usize, recent_window: usize) -> Self {
        Self {
            level,
            min_spacing,
            recent_window,
        }
    }

    pub fn level(&self) -> MetafictionLevel {
        self.level
    }

    /// Evaluate one paragraph. Ceiling and spacing gates run before the
    /// trial, so an arbitrarily long run can never exceed the level's
    /// insertion ceiling or cluster insertions.
    pub fn evaluate(
        &self,
        paragraph_text: &str,
        paragraph_index: usize,
        stage: Stage,
        usage: &UsageTracker,
        rng: &mut SmallRng,
    ) -> InsertionDecision {
        if usage.metafiction_count() >= self.level.max_insertions() {
            return InsertionDecision::skip();
        }
        if let Some(last) = usage.last_metafiction_paragraph() {
            if paragraph_index.saturating_sub(last) < self.min_spacing {
                return InsertionDecision::skip();
            }
        }

        let score = self.strategic_score(paragraph_text, stage);
        let probability = (self.level.base_probability() + score).clamp(0.0, MAX_INSERTION_PROBABILITY);
        if !rng.random_bool(probability) {
            return InsertionDecision::skip();
        }

        InsertionDecision {
            insert: true,
            category: Some(self.pick_category(usage, rng)),
        }
    }

    /// Signal score from the paragraph text and the dialectical position.
    pub fn strategic_score(&self, paragraph_text: &str, stage: Stage) -> f64 {
        let absolutes = ABSOLUTE_CLAIM_RE.find_iter(paragraph_text).count();
        let absolute_score = (absolutes as f64 * ABSOLUTE_CLAIM_BONUS).min(ABSOLUTE_CLAIM_CAP);

        let italics = ITALIC_RE.find_iter(paragraph_text).count().min(ITALIC_MARKER_CAP);
        let italic_score = italics as f64 * ITALIC_MARKER_BONUS;

        let stage_score = match stage {
            Stage::Thesis => 0.0,
            Stage::Antithesis => ANTITHESIS_BONUS,
            Stage::Synthesis => SYNTHESIS_BONUS,
        };

        absolute_score + italic_score + stage_score
    }

    /// Pick a category avoiding the most recently used ones. If the window
    /// covers every category, fall back to the full set rather than stall.
    fn pick_category(&self, usage: &UsageTracker, rng: &mut SmallRng) -> MetafictionCategory {
        let recent = usage.recent_metafiction_categories(self.recent_window);
        let fresh: Vec<MetafictionCategory> = MetafictionCategory::ALL
            .iter()
            .copied()
            .filter(|c| !recent.contains(c))
            .collect();
        let pool = if fresh.is_empty() {
            MetafictionCategory::ALL.to_vec()
        } else {
            fresh
        };
        pool[rng.random_range(0..pool.len())]
    }
}
