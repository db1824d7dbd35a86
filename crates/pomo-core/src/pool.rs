//! Weighted-sampling container over the three entity categories.

use std::collections::{HashMap, HashSet};

use rand::Rng;
use rand::rngs::SmallRng;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::constants::{DECAY_FACTOR, RELATED_BOOST, SCORE_FLOOR};
use crate::entity::{Entity, EntityCategory, EntityId};
use crate::error::{CoherenceError, Result};
use crate::graph::ConceptGraph;
use crate::theme::Theme;

/// Generic weighted-sampling container.
///
/// Entities live in one insertion-ordered vec (load order), indexed by id.
/// Candidate iteration always follows that order, so a fixed seed gives a
/// fixed draw sequence.
///
/// Drawing has no side effect: callers draw speculatively and call
/// `record_usage` exactly once per logical use. Weight updates are
/// monotonic within a run and never renormalized; the growing spread
/// trades long-run uniformity for strong short-range coherence.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EntityPool {
    entities: Vec<Entity>,
    #[serde(skip)]
    index: HashMap<EntityId, usize>,
}

impl EntityPool {
    /// Build a pool from loaded entities. Duplicate ids are a configuration
    /// error.
    pub fn new(entities: Vec<Entity>) -> Result<Self> {
        let mut index = HashMap::with_capacity(entities.len());
        for (i, e) in entities.iter().enumerate() {
            if index.insert(e.id.clone(), i).is_some() {
                return Err(CoherenceError::InvalidConfiguration(format!(
                    "duplicate entity id '{}'",
                    e.id
                )));
            }
        }
        Ok(Self { entities, index })
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    pub fn get(&self, id: &EntityId) -> Option<&Entity> {
        self.index.get(id).map(|&i| &self.entities[i])
    }

    pub fn iter(&self) -> impl Iterator<Item = &Entity> {
        self.entities.iter()
    }

    pub fn by_category(&self, category: EntityCategory) -> impl Iterator<Item = &Entity> {
        self.entities.iter().filter(move |e| e.category == category)
    }

    /// First entity of a category in load order, the documented fallback
    /// when a draw comes up empty.
    pub fn first_of(&self, category: EntityCategory) -> Option<&Entity> {
        self.by_category(category).next()
    }

    /// Effective draw score: floored weight times the theme multiplier.
    fn effective_score(&self, entity: &Entity, theme: Option<&Theme>) -> f64 {
        let multiplier = theme.map_or(1.0, |t| t.multiplier(&entity.id));
        entity.weight.max(SCORE_FLOOR) * multiplier
    }

    /// Weighted-random draw of one entity of `category`, excluding
    /// `excluded` ids (entities already used earlier in the same sentence).
    ///
    /// Fails with `EmptyPool` when exclusions leave no candidate, a
    /// recoverable condition the caller resolves with a documented default.
    pub fn draw(
        &self,
        category: EntityCategory,
        theme: Option<&Theme>,
        excluded: &HashSet<EntityId>,
        rng: &mut SmallRng,
    ) -> Result<&Entity> {
        let candidates: Vec<&Entity> = self
            .by_category(category)
            .filter(|e| !excluded.contains(&e.id))
            .collect();
        self.draw_weighted(candidates, category, theme, excluded.len(), rng)
    }

    /// Weighted draw restricted to an explicit candidate list, preserving
    /// the list's order. Unknown ids are skipped.
    pub fn draw_from(
        &self,
        ids: &[EntityId],
        category: EntityCategory,
        theme: Option<&Theme>,
        excluded: &HashSet<EntityId>,
        rng: &mut SmallRng,
    ) -> Result<&Entity> {
        let candidates: Vec<&Entity> = ids
            .iter()
            .filter_map(|id| self.get(id))
            .filter(|e| e.category == category && !excluded.contains(&e.id))
            .collect();
        self.draw_weighted(candidates, category, theme, excluded.len(), rng)
    }

    fn draw_weighted<'a>(
        &'a self,
        candidates: Vec<&'a Entity>,
        category: EntityCategory,
        theme: Option<&Theme>,
        excluded: usize,
        rng: &mut SmallRng,
    ) -> Result<&'a Entity> {
        if candidates.is_empty() {
            return Err(CoherenceError::EmptyPool { category, excluded });
        }
        let scores: Vec<f64> = candidates
            .iter()
            .map(|e| self.effective_score(e, theme))
            .collect();
        let total: f64 = scores.iter().sum();
        let mut roll = rng.random_range(0.0..total);
        for (&entity, score) in candidates.iter().zip(&scores) {
            if roll < *score {
                return Ok(entity);
            }
            roll -= score;
        }
        // Floating-point edge: the roll consumed every bucket.
        Ok(candidates[candidates.len() - 1])
    }

    /// Record one logical use of an entity with the default decay and boost.
    pub fn record_usage(
        &mut self,
        id: &EntityId,
        graph: &ConceptGraph,
        theme: Option<&Theme>,
        position: u64,
    ) {
        self.record_usage_with(id, graph, theme, position, DECAY_FACTOR, RELATED_BOOST);
    }

    /// Record one logical use with explicit factors.
    ///
    /// Multiplies the used entity's weight by `decay_factor` and the weight
    /// of every entity related to it (graph neighbor of any kind, or
    /// theme-core co-member) by `related_boost`. Calling this twice for the
    /// same draw double-applies both factors; callers own the
    /// exactly-once contract.
    pub fn record_usage_with(
        &mut self,
        id: &EntityId,
        graph: &ConceptGraph,
        theme: Option<&Theme>,
        position: u64,
        decay_factor: f64,
        related_boost: f64,
    ) {
        let Some(&used_idx) = self.index.get(id) else {
            warn!(entity = %id, "record_usage for unknown entity ignored");
            return;
        };

        // Related set: graph neighbors first, then theme-core co-members,
        // order-preserving dedup, never the used entity itself.
        let mut related: Vec<EntityId> = Vec::new();
        for neighbor in graph.neighbors(id) {
            if neighbor != *id && !related.contains(&neighbor) {
                related.push(neighbor);
            }
        }
        if let Some(theme) = theme {
            if theme.is_core(id) {
                for member in &theme.core {
                    if member != id && !related.contains(member) {
                        related.push(member.clone());
                    }
                }
            }
        }

        let entity = &mut self.entities[used_idx];
        entity.weight *= decay_factor;
        entity.last_used = Some(position);

        for rel_id in &related {
            if let Some(&i) = self.index.get(rel_id) {
                self.entities[i].weight *= related_boost;
            }
        }
    }

    /// Rebuild the id index after deserialization.
    pub fn rebuild_index(&mut self) {
        self.index = self
            .entities
            .iter()
            .enumerate()
            .map(|(i, e)| (e.id.clone(), i))
            .collect();
    }
}
