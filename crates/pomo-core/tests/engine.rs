//! Integration tests exercising the full engine through the facade:
//! construction → dialectical progression → selection → metafiction →
//! snapshot/restore, across module boundaries.

use std::collections::HashSet;

use pomo_core::{
    CoherenceError, CoherenceManager, Entity, EntityCategory, EntityId, KnowledgeSnapshot,
    MetafictionLevel, RelationKind, RelationSpec, Stage, Theme,
};

fn id(s: &str) -> EntityId {
    EntityId::from_display(s)
}

/// A small but fully connected knowledge snapshot in the shape the provider
/// would deliver.
fn snapshot() -> KnowledgeSnapshot {
    let mut entities = Vec::new();
    for philosopher in [
        "Jean Baudrillard",
        "Michel Foucault",
        "Donna Haraway",
        "Gilles Deleuze",
    ] {
        entities.push(Entity::new(philosopher, EntityCategory::Philosopher));
    }
    for concept in [
        "simulacra",
        "hyperreality",
        "biopolitics",
        "discipline",
        "cyborg",
        "posthumanism",
        "rhizome",
        "assemblage",
    ] {
        entities.push(Entity::new(concept, EntityCategory::Concept));
    }
    for term in ["discourse", "subjectivity", "hegemony", "aporia", "bricolage"] {
        entities.push(Entity::new(term, EntityCategory::Term));
    }

    KnowledgeSnapshot {
        entities,
        themes: vec![
            Theme {
                key: "digital_subjectivity".to_string(),
                description: "Identity under computational mediation".to_string(),
                core: vec![id("cyborg"), id("posthumanism"), id("Donna Haraway")],
                associated: vec![id("subjectivity"), id("discourse")],
                context_phrases: vec![],
                adjectives: vec![],
            },
            Theme {
                key: "simulation".to_string(),
                description: "The precession of the model".to_string(),
                core: vec![id("simulacra"), id("hyperreality"), id("Jean Baudrillard")],
                associated: vec![id("discourse")],
                context_phrases: vec![],
                adjectives: vec![],
            },
        ],
        relations: vec![
            RelationSpec {
                a: id("simulacra"),
                b: id("hyperreality"),
                kind: RelationKind::Complements,
                strength: 0.9,
                symmetric: true,
            },
            RelationSpec {
                a: id("discipline"),
                b: id("biopolitics"),
                kind: RelationKind::IsFoundationalTo,
                strength: 0.8,
                symmetric: false,
            },
            RelationSpec {
                a: id("cyborg"),
                b: id("posthumanism"),
                kind: RelationKind::Complements,
                strength: 0.7,
                symmetric: true,
            },
            RelationSpec {
                a: id("rhizome"),
                b: id("assemblage"),
                kind: RelationKind::Complements,
                strength: 0.6,
                symmetric: true,
            },
            RelationSpec {
                a: id("simulacra"),
                b: id("discipline"),
                kind: RelationKind::Critiques,
                strength: 0.5,
                symmetric: false,
            },
        ],
        oppositions: vec![
            (id("cyborg"), id("biopolitics")),
            (id("rhizome"), id("discipline")),
        ],
        advocacies: vec![
            (id("Jean Baudrillard"), id("simulacra")),
            (id("Jean Baudrillard"), id("hyperreality")),
            (id("Michel Foucault"), id("biopolitics")),
            (id("Michel Foucault"), id("discipline")),
            (id("Donna Haraway"), id("cyborg")),
            (id("Gilles Deleuze"), id("rhizome")),
            (id("Gilles Deleuze"), id("assemblage")),
        ],
    }
}

fn manager(seed: u64) -> CoherenceManager {
    CoherenceManager::new(
        snapshot(),
        Some("digital_subjectivity"),
        MetafictionLevel::Moderate,
        seed,
    )
    .unwrap()
}

/// Drive a representative run and return its selection trace.
fn drive(seed: u64) -> Vec<(EntityId, pomo_core::UsageRole, u64)> {
    let mut mgr = manager(seed);
    for section in 0..6 {
        let (_, concept) = mgr.next_dialectical_stage(section).unwrap();
        for paragraph in 0..2 {
            let subject = mgr
                .select_subject(EntityCategory::Concept, &format!("section-{section}"))
                .unwrap();
            let _ = mgr
                .select_related(&subject.id, EntityCategory::Philosopher, "body")
                .unwrap();
            let _ = mgr
                .select_related(&concept.id, EntityCategory::Term, "body")
                .unwrap();
            let _ = mgr.decide_metafiction(
                "the *cyborg* is necessarily the very condition of *discourse*",
                section * 2 + paragraph,
            );
        }
    }
    mgr.usage_tracker().selection_trace()
}

#[test]
fn determinism_fixed_seed_reproduces_trace() {
    assert_eq!(drive(38), drive(38));
}

#[test]
fn different_seeds_diverge() {
    assert_ne!(drive(38), drive(1138));
}

#[test]
fn scenario_digital_subjectivity_seed_38_five_sections() {
    let mut mgr = CoherenceManager::new(
        snapshot(),
        Some("digital_subjectivity"),
        MetafictionLevel::Moderate,
        38,
    )
    .unwrap();

    let mut stages = Vec::new();
    let mut concepts = Vec::new();
    for section in 0..5 {
        let (stage, concept) = mgr.next_dialectical_stage(section).unwrap();
        stages.push(stage);
        concepts.push(concept.id);
    }

    assert_eq!(
        stages,
        vec![
            Stage::Thesis,
            Stage::Antithesis,
            Stage::Synthesis,
            Stage::Thesis,
            Stage::Antithesis,
        ]
    );
    // The reopened thesis is the synthesis that closed the first triad.
    assert_eq!(concepts[3], concepts[2]);
    // And the antithesis of each triad differs from its thesis.
    assert_ne!(concepts[1], concepts[0]);
    assert_ne!(concepts[4], concepts[3]);
}

#[test]
fn scenario_full_category_exclusion_recovers() {
    let mut mgr = manager(9);
    let all_terms: HashSet<EntityId> = ["discourse", "subjectivity", "hegemony", "aporia", "bricolage"]
        .iter()
        .map(|s| id(s))
        .collect();

    // Exclusions cover the whole category: no error escapes the facade and
    // generation proceeds with the documented default.
    let entity = mgr
        .select_subject_excluding(EntityCategory::Term, "body", &all_terms)
        .unwrap();
    assert_eq!(entity.category, EntityCategory::Term);

    // The run keeps going afterwards.
    let next = mgr.select_subject(EntityCategory::Term, "body").unwrap();
    assert_eq!(next.category, EntityCategory::Term);
}

#[test]
fn decay_and_boost_are_visible_through_facade() {
    let mut mgr = manager(4);
    let subject = mgr.select_subject(EntityCategory::Concept, "introduction").unwrap();

    let used = mgr.entity(&subject.id).unwrap();
    assert!(used.weight < 1.0, "used entity should decay");

    let neighbors = mgr.graph().neighbors(&subject.id);
    let boosted = neighbors
        .iter()
        .filter(|n| mgr.entity(n).is_some_and(|e| e.weight > 1.0))
        .count();
    // Every concept in this snapshot has at least one neighbor.
    assert!(boosted > 0, "neighbors of {} should be boosted", subject.id);
}

#[test]
fn speculative_section_rolls_back_cleanly() {
    let mut mgr = manager(77);
    let _ = mgr.next_dialectical_stage(0).unwrap();
    let committed = mgr.usage_tracker().selection_trace();
    let saved = mgr.snapshot();

    // A speculative attempt that the driver decides to discard.
    for paragraph in 0..4 {
        let subject = mgr.select_subject(EntityCategory::Concept, "speculative").unwrap();
        let _ = mgr.select_related(&subject.id, EntityCategory::Philosopher, "speculative");
        let _ = mgr.decide_metafiction("always *power* inevitably", paragraph);
    }
    mgr.restore(saved).unwrap();

    assert_eq!(mgr.usage_tracker().selection_trace(), committed);
    assert_eq!(mgr.usage_tracker().metafiction_count(), 0);

    // The retried section replays the exact randomness the discarded one saw.
    let retry_first = mgr.select_subject(EntityCategory::Concept, "retry").unwrap();
    let mut mgr2 = manager(77);
    let _ = mgr2.next_dialectical_stage(0).unwrap();
    let original_first = mgr2.select_subject(EntityCategory::Concept, "retry").unwrap();
    assert_eq!(retry_first.id, original_first.id);
}

#[test]
fn empty_snapshot_collections_abort_before_generation() {
    let mut empty_relations = snapshot();
    empty_relations.relations.clear();
    let err = CoherenceManager::new(empty_relations, None, MetafictionLevel::Subtle, 1).unwrap_err();
    assert!(matches!(err, CoherenceError::InvalidConfiguration(_)));

    let mut empty_oppositions = snapshot();
    empty_oppositions.oppositions.clear();
    assert!(CoherenceManager::new(empty_oppositions, None, MetafictionLevel::Subtle, 1).is_err());
}

#[test]
fn theme_bias_dominates_early_selection() {
    // Under the digital_subjectivity theme, core concepts should dominate
    // the first draws across many seeds.
    let mut core_hits = 0;
    let total = 100;
    for seed in 0..total {
        let mut mgr = manager(seed);
        let subject = mgr.select_subject(EntityCategory::Concept, "introduction").unwrap();
        if subject.id == id("cyborg") || subject.id == id("posthumanism") {
            core_hits += 1;
        }
    }
    // Two core members at multiplier 3.0 against six others: expected share
    // 6/12. Anything clearly above the unbiased 2/8 share shows the bias.
    assert!(core_hits > total / 4, "core hits {core_hits}/{total}");
}

#[test]
fn metafiction_state_respects_level_ceiling_across_run() {
    for level in [
        MetafictionLevel::Subtle,
        MetafictionLevel::Moderate,
        MetafictionLevel::HighlySelfAware,
    ] {
        let mut mgr =
            CoherenceManager::new(snapshot(), Some("simulation"), level, 55).unwrap();
        let mut insertions = 0;
        for paragraph in 0..500 {
            if mgr
                .decide_metafiction("always necessarily *simulacra* *spectacle*", paragraph)
                .insert
            {
                insertions += 1;
            }
        }
        assert!(
            insertions <= level.max_insertions(),
            "{insertions} insertions exceed ceiling for {level}"
        );
    }
}
