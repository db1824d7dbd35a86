//! Append-only usage history for one run: what was selected, when, and in
//! what role, across three independent streams (entities, note categories,
//! metafiction categories), each with its own recency window.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::entity::{EntityCategory, EntityId};
use crate::placement::MetafictionCategory;

/// Role an entity played when it was selected.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UsageRole {
    /// Drawn as the subject of a sentence or section.
    Subject,
    /// Drawn as a neighbor of another entity.
    Related,
    /// Drawn as the organizing concept of a dialectical stage.
    Dialectic,
}

/// One append-only log entry. Never deleted during a run.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct UsageRecord {
    pub entity: EntityId,
    pub category: EntityCategory,
    pub role: UsageRole,
    pub position: u64,
    pub section: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
struct NoteUse {
    category: String,
    position: u64,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
struct MetafictionUse {
    category: MetafictionCategory,
    paragraph: usize,
}

/// Per-run usage history.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct UsageTracker {
    entities: Vec<UsageRecord>,
    notes: Vec<NoteUse>,
    metafiction: Vec<MetafictionUse>,
}

impl UsageTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_entity(&mut self, record: UsageRecord) {
        self.entities.push(record);
    }

    pub fn record_note(&mut self, category: &str, position: u64) {
        self.notes.push(NoteUse {
            category: category.to_string(),
            position,
        });
    }

    pub fn record_metafiction(&mut self, category: MetafictionCategory, paragraph: usize) {
        self.metafiction.push(MetafictionUse { category, paragraph });
    }

    pub fn entity_log(&self) -> &[UsageRecord] {
        &self.entities
    }

    /// Sequence of (entity, role, position) tuples, the determinism probe.
    pub fn selection_trace(&self) -> Vec<(EntityId, UsageRole, u64)> {
        self.entities
            .iter()
            .map(|r| (r.entity.clone(), r.role, r.position))
            .collect()
    }

    pub fn metafiction_count(&self) -> usize {
        self.metafiction.len()
    }

    pub fn last_metafiction_paragraph(&self) -> Option<usize> {
        self.metafiction.last().map(|m| m.paragraph)
    }

    /// The `n` most recently used metafiction categories, most recent first.
    pub fn recent_metafiction_categories(&self, n: usize) -> Vec<MetafictionCategory> {
        self.metafiction
            .iter()
            .rev()
            .take(n)
            .map(|m| m.category)
            .collect()
    }

    pub fn note_count(&self) -> usize {
        self.notes.len()
    }

    /// The `n` most recently used note categories, most recent first.
    pub fn recent_note_categories(&self, n: usize) -> Vec<String> {
        self.notes
            .iter()
            .rev()
            .take(n)
            .map(|u| u.category.clone())
            .collect()
    }

    /// Aggregate counts for diagnostics and works-cited assembly.
    pub fn summary(&self) -> UsageSummary {
        let mut philosophers: BTreeMap<EntityId, usize> = BTreeMap::new();
        let mut concepts: BTreeMap<EntityId, usize> = BTreeMap::new();
        let mut terms: BTreeMap<EntityId, usize> = BTreeMap::new();
        for record in &self.entities {
            let bucket = match record.category {
                EntityCategory::Philosopher => &mut philosophers,
                EntityCategory::Concept => &mut concepts,
                EntityCategory::Term => &mut terms,
            };
            *bucket.entry(record.entity.clone()).or_default() += 1;
        }
        UsageSummary {
            philosophers: sorted_counts(philosophers),
            concepts: sorted_counts(concepts),
            terms: sorted_counts(terms),
            metafiction_insertions: self.metafiction.len(),
            notes: self.notes.len(),
        }
    }
}

fn sorted_counts(map: BTreeMap<EntityId, usize>) -> Vec<(EntityId, usize)> {
    let mut counts: Vec<(EntityId, usize)> = map.into_iter().collect();
    // Highest count first; the BTreeMap origin makes equal counts id-ordered.
    counts.sort_by(|a, b| b.1.cmp(&a.1));
    counts
}

/// Counts per entity and category for post-hoc analysis or export metadata.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct UsageSummary {
    pub philosophers: Vec<(EntityId, usize)>,
    pub concepts: Vec<(EntityId, usize)>,
    pub terms: Vec<(EntityId, usize)>,
    pub metafiction_insertions: usize,
    pub notes: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(s: &str) -> EntityId {
        EntityId::from_display(s)
    }

    fn record(entity: &str, category: EntityCategory, position: u64) -> UsageRecord {
        UsageRecord {
            entity: id(entity),
            category,
            role: UsageRole::Subject,
            position,
            section: "introduction".to_string(),
        }
    }

    #[test]
    fn test_streams_are_independent() {
        let mut tracker = UsageTracker::new();
        tracker.record_entity(record("simulacra", EntityCategory::Concept, 1));
        tracker.record_note("historical", 2);
        tracker.record_metafiction(MetafictionCategory::Complicity, 0);

        assert_eq!(tracker.entity_log().len(), 1);
        assert_eq!(tracker.note_count(), 1);
        assert_eq!(tracker.metafiction_count(), 1);
    }

    #[test]
    fn test_recent_metafiction_most_recent_first() {
        let mut tracker = UsageTracker::new();
        tracker.record_metafiction(MetafictionCategory::Complicity, 0);
        tracker.record_metafiction(MetafictionCategory::Paradox, 3);
        tracker.record_metafiction(MetafictionCategory::Reflexivity, 6);

        let recent = tracker.recent_metafiction_categories(2);
        assert_eq!(
            recent,
            vec![MetafictionCategory::Reflexivity, MetafictionCategory::Paradox]
        );
        assert_eq!(tracker.last_metafiction_paragraph(), Some(6));
    }

    #[test]
    fn test_summary_counts_by_category() {
        let mut tracker = UsageTracker::new();
        tracker.record_entity(record("simulacra", EntityCategory::Concept, 1));
        tracker.record_entity(record("simulacra", EntityCategory::Concept, 2));
        tracker.record_entity(record("Jean Baudrillard", EntityCategory::Philosopher, 3));
        tracker.record_entity(record("discourse", EntityCategory::Term, 4));

        let summary = tracker.summary();
        assert_eq!(summary.concepts, vec![(id("simulacra"), 2)]);
        assert_eq!(summary.philosophers, vec![(id("Jean Baudrillard"), 1)]);
        assert_eq!(summary.terms, vec![(id("discourse"), 1)]);
    }

    #[test]
    fn test_summary_orders_by_count_then_id() {
        let mut tracker = UsageTracker::new();
        tracker.record_entity(record("trace", EntityCategory::Concept, 1));
        tracker.record_entity(record("aporia", EntityCategory::Concept, 2));
        tracker.record_entity(record("trace", EntityCategory::Concept, 3));
        tracker.record_entity(record("bricolage", EntityCategory::Concept, 4));

        let summary = tracker.summary();
        assert_eq!(summary.concepts[0], (id("trace"), 2));
        // Equal counts fall back to id order
        assert_eq!(summary.concepts[1], (id("aporia"), 1));
        assert_eq!(summary.concepts[2], (id("bricolage"), 1));
    }
}
