//! Input contract with the knowledge-base provider.
//!
//! The provider hands the engine one read-only snapshot per run. The engine
//! fails fast with `InvalidConfiguration` if any required collection is
//! empty or references an unknown entity; an empty table must never pass
//! silently into the sampling logic.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::entity::{Entity, EntityCategory, EntityId};
use crate::error::{CoherenceError, Result};
use crate::graph::RelationKind;
use crate::theme::Theme;

/// One typed edge as supplied by the provider.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RelationSpec {
    pub a: EntityId,
    pub b: EntityId,
    pub kind: RelationKind,
    pub strength: f64,
    /// Symmetric edges are added in both directions.
    pub symmetric: bool,
}

/// Read-only knowledge snapshot consumed at run construction.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct KnowledgeSnapshot {
    /// All entities across the three categories, in load order.
    pub entities: Vec<Entity>,
    /// Named thematic clusters, in load order.
    pub themes: Vec<Theme>,
    /// Concept relations, curated edges first.
    pub relations: Vec<RelationSpec>,
    /// Curated thesis/antithesis pairs.
    pub oppositions: Vec<(EntityId, EntityId)>,
    /// Philosopher → concept advocacy links.
    pub advocacies: Vec<(EntityId, EntityId)>,
}

impl KnowledgeSnapshot {
    pub fn theme(&self, key: &str) -> Option<&Theme> {
        self.themes.iter().find(|t| t.key == key)
    }

    pub fn theme_keys(&self) -> Vec<&str> {
        self.themes.iter().map(|t| t.key.as_str()).collect()
    }

    fn count(&self, category: EntityCategory) -> usize {
        self.entities.iter().filter(|e| e.category == category).count()
    }

    /// Validate the snapshot before any generation begins.
    pub fn validate(&self) -> Result<()> {
        for category in [
            EntityCategory::Philosopher,
            EntityCategory::Concept,
            EntityCategory::Term,
        ] {
            if self.count(category) == 0 {
                return Err(CoherenceError::InvalidConfiguration(format!(
                    "no {} entities supplied",
                    category.label()
                )));
            }
        }
        if self.themes.is_empty() {
            return Err(CoherenceError::InvalidConfiguration(
                "no themes supplied".to_string(),
            ));
        }
        if self.relations.is_empty() {
            return Err(CoherenceError::InvalidConfiguration(
                "no concept relations supplied".to_string(),
            ));
        }
        if self.oppositions.is_empty() {
            return Err(CoherenceError::InvalidConfiguration(
                "no oppositional pairs supplied".to_string(),
            ));
        }

        let concepts: HashSet<&EntityId> = self
            .entities
            .iter()
            .filter(|e| e.category == EntityCategory::Concept)
            .map(|e| &e.id)
            .collect();
        let philosophers: HashSet<&EntityId> = self
            .entities
            .iter()
            .filter(|e| e.category == EntityCategory::Philosopher)
            .map(|e| &e.id)
            .collect();

        for relation in &self.relations {
            for end in [&relation.a, &relation.b] {
                if !concepts.contains(end) {
                    return Err(CoherenceError::InvalidConfiguration(format!(
                        "relation endpoint '{end}' is not a known concept"
                    )));
                }
            }
            if relation.a == relation.b {
                return Err(CoherenceError::InvalidConfiguration(format!(
                    "relation connects '{}' to itself",
                    relation.a
                )));
            }
        }
        for (a, b) in &self.oppositions {
            for end in [a, b] {
                if !concepts.contains(end) {
                    return Err(CoherenceError::InvalidConfiguration(format!(
                        "oppositional pair member '{end}' is not a known concept"
                    )));
                }
            }
            if a == b {
                return Err(CoherenceError::InvalidConfiguration(format!(
                    "oppositional pair opposes '{a}' to itself"
                )));
            }
        }
        for (philosopher, concept) in &self.advocacies {
            if !philosophers.contains(philosopher) {
                return Err(CoherenceError::InvalidConfiguration(format!(
                    "advocacy source '{philosopher}' is not a known philosopher"
                )));
            }
            if !concepts.contains(concept) {
                return Err(CoherenceError::InvalidConfiguration(format!(
                    "advocacy target '{concept}' is not a known concept"
                )));
            }
        }
        Ok(())
    }
}
