use std::fmt;

use serde::{Deserialize, Serialize};

/// Stable identifier for an entity: a slug of its display string.
///
/// Slugs are lowercase, alphanumeric (Unicode), with runs of separators and
/// punctuation collapsed to single dashes, so `"power/knowledge"` and
/// `"Power Knowledge"` both map to `power-knowledge`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(String);

impl EntityId {
    /// Build an id from a display string by slugging it.
    pub fn from_display(display: &str) -> Self {
        let mut slug = String::with_capacity(display.len());
        for ch in display.chars() {
            if ch.is_alphanumeric() {
                for lc in ch.to_lowercase() {
                    slug.push(lc);
                }
            } else if !slug.ends_with('-') {
                slug.push('-');
            }
        }
        EntityId(slug.trim_matches('-').to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The three disjoint entity categories.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityCategory {
    Philosopher,
    Concept,
    Term,
}

impl EntityCategory {
    pub fn label(&self) -> &'static str {
        match self {
            EntityCategory::Philosopher => "philosopher",
            EntityCategory::Concept => "concept",
            EntityCategory::Term => "term",
        }
    }
}

/// A selectable item: a philosopher, concept, or term.
///
/// `weight` is a relative score for weighted draws, never a probability.
/// It starts at 1.0, decays multiplicatively on use, and is boosted when a
/// related entity is used. Invariant: `weight >= 0`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Entity {
    pub id: EntityId,
    pub display: String,
    pub category: EntityCategory,
    /// Theme-cluster tags, in load order.
    pub tags: Vec<String>,
    pub weight: f64,
    /// Sequence position of the most recent use, if any.
    pub last_used: Option<u64>,
}

impl Entity {
    pub fn new(display: &str, category: EntityCategory) -> Self {
        Self {
            id: EntityId::from_display(display),
            display: display.to_string(),
            category,
            tags: Vec::new(),
            weight: 1.0,
            last_used: None,
        }
    }

    pub fn with_tag(mut self, tag: &str) -> Self {
        if !self.tags.iter().any(|t| t == tag) {
            self.tags.push(tag.to_string());
        }
        self
    }
}
