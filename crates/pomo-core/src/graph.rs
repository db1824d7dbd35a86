//! Concept-relationship graph: typed weighted edges between concepts, a
//! curated oppositional-pair table, and philosopher/concept advocacy links.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::entity::EntityId;

/// Kind of a concept relation. The set is open: data sources may supply
/// kinds the engine has no special handling for, carried as `Other`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum RelationKind {
    Critiques,
    IsFoundationalTo,
    Complements,
    Other(String),
}

impl From<String> for RelationKind {
    fn from(s: String) -> Self {
        match s.as_str() {
            "critiques" => RelationKind::Critiques,
            "is_foundational_to" => RelationKind::IsFoundationalTo,
            "complements" => RelationKind::Complements,
            _ => RelationKind::Other(s),
        }
    }
}

impl From<RelationKind> for String {
    fn from(kind: RelationKind) -> Self {
        match kind {
            RelationKind::Critiques => "critiques".to_string(),
            RelationKind::IsFoundationalTo => "is_foundational_to".to_string(),
            RelationKind::Complements => "complements".to_string(),
            RelationKind::Other(s) => s,
        }
    }
}

/// A directed edge from some concept to `target`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ConceptRelation {
    pub target: EntityId,
    pub kind: RelationKind,
    /// Strength in roughly 0..=1; stronger edges rank first.
    pub strength: f64,
}

/// The relationship graph consulted for dialectical progression, related
/// draws, and boost propagation.
///
/// Edge lists keep insertion order until `finalize()` sorts them by
/// descending strength with a stable sort, so ties break by insertion order
/// and lookups are deterministic under a fixed seed.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ConceptGraph {
    relations: HashMap<EntityId, Vec<ConceptRelation>>,
    /// Curated thesis/antithesis pairs, indexed both directions.
    oppositions: HashMap<EntityId, EntityId>,
    /// Philosopher -> concepts they expound.
    corpus: HashMap<EntityId, Vec<EntityId>>,
    /// Concept -> philosophers who expound it.
    advocates: HashMap<EntityId, Vec<EntityId>>,
}

impl ConceptGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a directed relation. A duplicate (target, kind) edge is ignored,
    /// so earlier insertions win; callers add curated edges before derived
    /// ones.
    pub fn add_relation(&mut self, from: EntityId, target: EntityId, kind: RelationKind, strength: f64) {
        let edges = self.relations.entry(from).or_default();
        if edges.iter().any(|r| r.target == target && r.kind == kind) {
            return;
        }
        edges.push(ConceptRelation {
            target,
            kind,
            strength: strength.clamp(0.0, 1.0),
        });
    }

    /// Add the same relation in both directions.
    pub fn add_symmetric(&mut self, a: EntityId, b: EntityId, kind: RelationKind, strength: f64) {
        self.add_relation(a.clone(), b.clone(), kind.clone(), strength);
        self.add_relation(b, a, kind, strength);
    }

    /// Register a curated oppositional pair. The first pair naming a concept
    /// wins; later pairs for the same concept are ignored.
    pub fn add_opposition(&mut self, a: EntityId, b: EntityId) {
        self.oppositions.entry(a.clone()).or_insert_with(|| b.clone());
        self.oppositions.entry(b).or_insert(a);
    }

    /// Register that `philosopher` expounds `concept`.
    pub fn add_advocacy(&mut self, philosopher: EntityId, concept: EntityId) {
        let corpus = self.corpus.entry(philosopher.clone()).or_default();
        if !corpus.contains(&concept) {
            corpus.push(concept.clone());
        }
        let advocates = self.advocates.entry(concept).or_default();
        if !advocates.contains(&philosopher) {
            advocates.push(philosopher);
        }
    }

    /// Sort every edge list by descending strength (stable, so insertion
    /// order breaks ties). Call once after loading, before any lookups.
    pub fn finalize(&mut self) {
        for edges in self.relations.values_mut() {
            edges.sort_by(|a, b| b.strength.partial_cmp(&a.strength).unwrap_or(std::cmp::Ordering::Equal));
        }
    }

    /// Relations of a concept, strongest first.
    pub fn relations_of(&self, id: &EntityId) -> &[ConceptRelation] {
        self.relations.get(id).map(|v| v.as_slice()).unwrap_or(&[])
    }

    /// The curated opposite of a concept, falling back to the strongest
    /// `critiques` relation. `None` means the caller must substitute an
    /// unrelated concept from the active theme.
    pub fn oppositional_concept_of(&self, id: &EntityId) -> Option<&EntityId> {
        if let Some(opp) = self.oppositions.get(id) {
            return Some(opp);
        }
        self.relations_of(id)
            .iter()
            .find(|r| r.kind == RelationKind::Critiques)
            .map(|r| &r.target)
    }

    /// Philosophers who expound a concept, in load order.
    pub fn advocates_of(&self, concept: &EntityId) -> &[EntityId] {
        self.advocates.get(concept).map(|v| v.as_slice()).unwrap_or(&[])
    }

    /// Concepts a philosopher expounds, in load order.
    pub fn corpus_of(&self, philosopher: &EntityId) -> &[EntityId] {
        self.corpus.get(philosopher).map(|v| v.as_slice()).unwrap_or(&[])
    }

    /// Everything directly related to an entity: relation targets (strongest
    /// first) then advocacy links, deduplicated preserving order. This is the
    /// set that receives the related boost on use.
    pub fn neighbors(&self, id: &EntityId) -> Vec<EntityId> {
        let mut out: Vec<EntityId> = Vec::new();
        for rel in self.relations_of(id) {
            if !out.contains(&rel.target) {
                out.push(rel.target.clone());
            }
        }
        for adv in self.advocates_of(id) {
            if !out.contains(adv) {
                out.push(adv.clone());
            }
        }
        for concept in self.corpus_of(id) {
            if !out.contains(concept) {
                out.push(concept.clone());
            }
        }
        out
    }

    pub fn relation_count(&self) -> usize {
        self.relations.values().map(|v| v.len()).sum()
    }

    pub fn opposition_count(&self) -> usize {
        self.oppositions.len()
    }
}
