//! Conversion from the JSON file model into the engine's input snapshot.
//!
//! Curated relations are passed through first; relations derived from
//! philosopher co-association and theme co-membership follow, so curated
//! edges win on conflict. All derivation iterates `BTreeMap`s and file
//! order, keeping the snapshot deterministic for a given file.

use std::collections::{BTreeMap, BTreeSet};

use tracing::{debug, warn};

use pomo_core::{
    Entity, EntityCategory, EntityId, KnowledgeSnapshot, RelationKind, RelationSpec, Theme,
};

use crate::schema::KbFile;

/// Strength assigned to relations derived from two concepts sharing a
/// philosopher's corpus.
const CO_ASSOCIATION_STRENGTH: f64 = 0.6;

/// Strength assigned to relations derived from two concepts sharing a
/// theme's key-concept set.
const THEME_CO_MEMBERSHIP_STRENGTH: f64 = 0.4;

pub struct Converted {
    pub snapshot: KnowledgeSnapshot,
    /// Philosopher id -> key works, for works-cited assembly.
    pub key_works: BTreeMap<EntityId, Vec<(String, u32)>>,
    /// Philosopher id -> attributable quotes.
    pub quotes: BTreeMap<EntityId, Vec<String>>,
}

pub fn convert(file: KbFile) -> Converted {
    let mut entities: Vec<Entity> = Vec::new();
    let mut seen: BTreeSet<EntityId> = BTreeSet::new();

    let mut push_all = |displays: &[String], category: EntityCategory, entities: &mut Vec<Entity>, seen: &mut BTreeSet<EntityId>| {
        for disp in displays {
            let id = EntityId::from_display(disp);
            if id.as_str().is_empty() {
                warn!(display = %disp, "skipping entity with empty slug");
                continue;
            }
            if !seen.insert(id) {
                // A string listed under two categories keeps its first
                // category (philosopher > concept > term load order).
                debug!(display = %disp, category = category.label(), "duplicate entity display skipped");
                continue;
            }
            entities.push(Entity::new(disp, category));
        }
    };

    push_all(&file.philosophers, EntityCategory::Philosopher, &mut entities, &mut seen);
    push_all(&file.concepts, EntityCategory::Concept, &mut entities, &mut seen);
    push_all(&file.terms, EntityCategory::Term, &mut entities, &mut seen);

    let concept_ids: BTreeSet<EntityId> = entities
        .iter()
        .filter(|e| e.category == EntityCategory::Concept)
        .map(|e| e.id.clone())
        .collect();
    let philosopher_ids: BTreeSet<EntityId> = entities
        .iter()
        .filter(|e| e.category == EntityCategory::Philosopher)
        .map(|e| e.id.clone())
        .collect();

    // Themes, tagging members as we go.
    let mut themes: Vec<Theme> = Vec::new();
    for (key, entry) in &file.thematic_clusters {
        let mut core: Vec<EntityId> = Vec::new();
        for disp in entry.core_philosophers.iter().chain(&entry.key_concepts) {
            let id = EntityId::from_display(disp);
            if seen.contains(&id) {
                if !core.contains(&id) {
                    core.push(id);
                }
            } else {
                warn!(theme = %key, member = %disp, "theme core member is not a known entity");
            }
        }
        let mut associated: Vec<EntityId> = Vec::new();
        for disp in &entry.relevant_terms {
            let id = EntityId::from_display(disp);
            if seen.contains(&id) {
                if !associated.contains(&id) && !core.contains(&id) {
                    associated.push(id);
                }
            } else {
                warn!(theme = %key, member = %disp, "theme associated member is not a known entity");
            }
        }

        for entity in entities.iter_mut() {
            if core.contains(&entity.id) || associated.contains(&entity.id) {
                if !entity.tags.iter().any(|t| t == key) {
                    entity.tags.push(key.clone());
                }
            }
        }

        themes.push(Theme {
            key: key.clone(),
            description: entry.description.clone(),
            core,
            associated,
            context_phrases: entry.context_phrases.clone(),
            adjectives: entry.related_adjectives.clone(),
        });
    }

    // Curated relations first: they win over derived duplicates.
    let mut relations: Vec<RelationSpec> = Vec::new();
    for entry in &file.concept_relations {
        relations.push(RelationSpec {
            a: EntityId::from_display(&entry.a),
            b: EntityId::from_display(&entry.b),
            kind: RelationKind::from(entry.kind.clone()),
            strength: entry.strength,
            symmetric: entry.symmetric,
        });
    }

    // Derived: concepts sharing a philosopher's corpus complement each other.
    for concepts in file.philosopher_concepts.values() {
        let known: Vec<EntityId> = concepts
            .iter()
            .map(|c| EntityId::from_display(c))
            .filter(|id| concept_ids.contains(id))
            .collect();
        for i in 0..known.len() {
            for j in (i + 1)..known.len() {
                relations.push(RelationSpec {
                    a: known[i].clone(),
                    b: known[j].clone(),
                    kind: RelationKind::Complements,
                    strength: CO_ASSOCIATION_STRENGTH,
                    symmetric: true,
                });
            }
        }
    }

    // Derived: concepts sharing a theme's key-concept set.
    for entry in file.thematic_clusters.values() {
        let known: Vec<EntityId> = entry
            .key_concepts
            .iter()
            .map(|c| EntityId::from_display(c))
            .filter(|id| concept_ids.contains(id))
            .collect();
        for i in 0..known.len() {
            for j in (i + 1)..known.len() {
                relations.push(RelationSpec {
                    a: known[i].clone(),
                    b: known[j].clone(),
                    kind: RelationKind::Complements,
                    strength: THEME_CO_MEMBERSHIP_STRENGTH,
                    symmetric: true,
                });
            }
        }
    }

    let oppositions: Vec<(EntityId, EntityId)> = file
        .oppositional_pairs
        .iter()
        .map(|(a, b)| (EntityId::from_display(a), EntityId::from_display(b)))
        .collect();

    // Advocacy links: philosopher -> each of their known concepts.
    let mut advocacies: Vec<(EntityId, EntityId)> = Vec::new();
    for (philosopher, concepts) in &file.philosopher_concepts {
        let philosopher_id = EntityId::from_display(philosopher);
        if !philosopher_ids.contains(&philosopher_id) {
            warn!(%philosopher, "philosopher_concepts names an unknown philosopher; skipped");
            continue;
        }
        for concept in concepts {
            let concept_id = EntityId::from_display(concept);
            if concept_ids.contains(&concept_id) {
                advocacies.push((philosopher_id.clone(), concept_id));
            }
        }
    }

    let key_works: BTreeMap<EntityId, Vec<(String, u32)>> = file
        .philosopher_key_works
        .iter()
        .map(|(name, works)| (EntityId::from_display(name), works.clone()))
        .filter(|(id, _)| philosopher_ids.contains(id))
        .collect();

    let quotes: BTreeMap<EntityId, Vec<String>> = file
        .quotes
        .iter()
        .map(|(name, lines)| (EntityId::from_display(name), lines.clone()))
        .filter(|(id, _)| philosopher_ids.contains(id))
        .collect();

    Converted {
        snapshot: KnowledgeSnapshot {
            entities,
            themes,
            relations,
            oppositions,
            advocacies,
        },
        key_works,
        quotes,
    }
}
