//! Facade composing the engine: the only component the surrounding
//! sentence/section generators call.

use std::collections::HashSet;

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, warn};

use crate::constants::{MIN_METAFICTION_SPACING, RECENT_CATEGORY_WINDOW};
use crate::dialectic::{DialecticalProgressor, Stage};
use crate::entity::{Entity, EntityCategory, EntityId};
use crate::error::{CoherenceError, Result};
use crate::graph::ConceptGraph;
use crate::input::KnowledgeSnapshot;
use crate::placement::{InsertionDecision, MetafictionLevel, StrategicPlacementDecider};
use crate::pool::EntityPool;
use crate::snapshot::Snapshot;
use crate::theme::Theme;
use crate::usage::{UsageRecord, UsageRole, UsageSummary, UsageTracker};

use uuid::Uuid;

/// Owns all mutable selection state for one essay-generation run.
///
/// One instance per run; nothing is shared across runs. Every random choice
/// in the run (entity draws, dialectical transitions, metafiction trials,
/// and, through `pick_index` and `chance`, the surface layer's own choices)
/// routes through the single seeded generator held here, so an identical
/// seed and knowledge base reproduce the run bit for bit.
#[derive(Debug)]
pub struct CoherenceManager {
    run_id: Uuid,
    seed: u64,
    rng: SmallRng,
    pool: EntityPool,
    graph: ConceptGraph,
    active_theme: Option<Theme>,
    tracker: UsageTracker,
    progressor: DialecticalProgressor,
    decider: StrategicPlacementDecider,
    position: u64,
}

impl CoherenceManager {
    /// Build a run from a validated knowledge snapshot.
    ///
    /// Fails with `InvalidConfiguration` before any generation begins if
    /// the snapshot is malformed or `theme_key` names an unknown theme.
    pub fn new(
        snapshot: KnowledgeSnapshot,
        theme_key: Option<&str>,
        level: MetafictionLevel,
        seed: u64,
    ) -> Result<Self> {
        snapshot.validate()?;

        let active_theme = match theme_key {
            Some(key) => Some(
                snapshot
                    .theme(key)
                    .cloned()
                    .ok_or_else(|| {
                        CoherenceError::InvalidConfiguration(format!("unknown theme '{key}'"))
                    })?,
            ),
            None => None,
        };

        let KnowledgeSnapshot {
            entities,
            themes: _,
            relations,
            oppositions,
            advocacies,
        } = snapshot;

        let pool = EntityPool::new(entities)?;

        let mut graph = ConceptGraph::new();
        for relation in relations {
            if relation.symmetric {
                graph.add_symmetric(relation.a, relation.b, relation.kind, relation.strength);
            } else {
                graph.add_relation(relation.a, relation.b, relation.kind, relation.strength);
            }
        }
        for (a, b) in oppositions {
            graph.add_opposition(a, b);
        }
        for (philosopher, concept) in advocacies {
            graph.add_advocacy(philosopher, concept);
        }
        graph.finalize();

        Ok(Self {
            run_id: Uuid::new_v4(),
            seed,
            rng: SmallRng::seed_from_u64(seed),
            pool,
            graph,
            active_theme,
            tracker: UsageTracker::new(),
            progressor: DialecticalProgressor::new(),
            decider: StrategicPlacementDecider::new(
                level,
                MIN_METAFICTION_SPACING,
                RECENT_CATEGORY_WINDOW,
            ),
            position: 0,
        })
    }

    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn active_theme(&self) -> Option<&Theme> {
        self.active_theme.as_ref()
    }

    pub fn metafiction_level(&self) -> MetafictionLevel {
        self.decider.level()
    }

    pub fn entity(&self, id: &EntityId) -> Option<&Entity> {
        self.pool.get(id)
    }

    pub fn graph(&self) -> &ConceptGraph {
        &self.graph
    }

    /// Draw a subject entity and record its usage, atomic from the
    /// caller's perspective.
    pub fn select_subject(&mut self, category: EntityCategory, section: &str) -> Result<Entity> {
        self.select_subject_excluding(category, section, &HashSet::new())
    }

    /// Draw a subject excluding entities already used in the same sentence.
    pub fn select_subject_excluding(
        &mut self,
        category: EntityCategory,
        section: &str,
        excluded: &HashSet<EntityId>,
    ) -> Result<Entity> {
        let entity = self.draw_or_default(category, excluded)?;
        self.note_entity_use(&entity, UsageRole::Subject, section);
        Ok(entity)
    }

    /// Draw an entity biased toward the graph neighborhood of `to`, falling
    /// back to a plain theme-biased draw when no neighbor exists in the
    /// requested category.
    pub fn select_related(
        &mut self,
        to: &EntityId,
        category: EntityCategory,
        section: &str,
    ) -> Result<Entity> {
        let mut excluded = HashSet::new();
        excluded.insert(to.clone());

        let neighborhood: Vec<EntityId> = self
            .graph
            .neighbors(to)
            .into_iter()
            .filter(|id| {
                self.pool
                    .get(id)
                    .is_some_and(|e| e.category == category && e.id != *to)
            })
            .collect();

        let entity = if neighborhood.is_empty() {
            debug!(entity = %to, category = category.label(), "no graph neighbor in category; theme-biased fallback draw");
            self.draw_or_default(category, &excluded)?
        } else {
            match self.pool.draw_from(
                &neighborhood,
                category,
                self.active_theme.as_ref(),
                &excluded,
                &mut self.rng,
            ) {
                Ok(entity) => entity.clone(),
                Err(CoherenceError::EmptyPool { .. }) => {
                    self.draw_or_default(category, &excluded)?
                }
                Err(err) => return Err(err),
            }
        };
        self.note_entity_use(&entity, UsageRole::Related, section);
        Ok(entity)
    }

    /// Advance the dialectical cursor for a new section and return its
    /// stage and organizing concept.
    pub fn next_dialectical_stage(&mut self, section_index: usize) -> Result<(Stage, Entity)> {
        let (stage, concept_id) = self.progressor.advance(
            &self.pool,
            &self.graph,
            self.active_theme.as_ref(),
            &mut self.rng,
        )?;
        let entity = self
            .pool
            .get(&concept_id)
            .cloned()
            .ok_or_else(|| {
                CoherenceError::StateCorruption(format!(
                    "dialectical concept '{concept_id}' missing from pool"
                ))
            })?;
        self.note_entity_use(&entity, UsageRole::Dialectic, &format!("section-{section_index}"));
        Ok((stage, entity))
    }

    /// Evaluate a just-generated paragraph for metafictional insertion.
    ///
    /// The decider itself is pure; accepted categories are recorded here so
    /// ceiling and spacing state live in one place and roll back with
    /// `restore`.
    pub fn decide_metafiction(
        &mut self,
        paragraph_text: &str,
        paragraph_index: usize,
    ) -> InsertionDecision {
        let stage = self.progressor.current_stage().unwrap_or(Stage::Thesis);
        let decision = self.decider.evaluate(
            paragraph_text,
            paragraph_index,
            stage,
            &self.tracker,
            &mut self.rng,
        );
        if let (true, Some(category)) = (decision.insert, decision.category) {
            self.tracker.record_metafiction(category, paragraph_index);
        }
        decision
    }

    /// One trial for a metafictional concluding sentence, at the level's
    /// configured probability.
    pub fn conclusion_metafiction(&mut self) -> bool {
        self.rng
            .random_bool(self.metafiction_level().conclusion_probability())
    }

    /// Record an endnote category into the note stream.
    pub fn record_note_category(&mut self, category: &str) {
        self.position += 1;
        self.tracker.record_note(category, self.position);
    }

    /// The `n` most recently used note categories, most recent first.
    pub fn recent_note_categories(&self, n: usize) -> Vec<String> {
        self.tracker.recent_note_categories(n)
    }

    /// Seeded index draw for surface-layer choices (templates, citations),
    /// so nothing in the run falls back to ambient randomness. `len` must
    /// be nonzero.
    pub fn pick_index(&mut self, len: usize) -> usize {
        self.rng.random_range(0..len)
    }

    /// Seeded Bernoulli trial for surface-layer choices.
    pub fn chance(&mut self, probability: f64) -> bool {
        self.rng.random_bool(probability.clamp(0.0, 1.0))
    }

    /// Save all mutable run state for speculative generation.
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            run_id: self.run_id,
            position: self.position,
            pool: self.pool.clone(),
            tracker: self.tracker.clone(),
            progressor: self.progressor.clone(),
            rng: self.rng.clone(),
        }
    }

    /// Restore state saved by `snapshot`. Every exit path from a
    /// speculative attempt must restore.
    pub fn restore(&mut self, snapshot: Snapshot) -> Result<()> {
        if snapshot.run_id != self.run_id {
            return Err(CoherenceError::StateCorruption(format!(
                "snapshot from run {} restored into run {}",
                snapshot.run_id, self.run_id
            )));
        }
        self.position = snapshot.position;
        self.pool = snapshot.pool;
        self.tracker = snapshot.tracker;
        self.progressor = snapshot.progressor;
        self.rng = snapshot.rng;
        Ok(())
    }

    /// Counts per entity and category for diagnostics and works-cited
    /// assembly.
    pub fn usage_summary(&self) -> UsageSummary {
        self.tracker.summary()
    }

    /// The raw selection log, for determinism probes and analysis.
    pub fn usage_tracker(&self) -> &UsageTracker {
        &self.tracker
    }

    // -- internals --

    /// Draw with the documented empty-pool fallback: first theme-core
    /// member of the category, else the first entity of the category in
    /// load order. One fallback, no retry loop, so pathological exclusion
    /// sets terminate instead of hanging.
    fn draw_or_default(
        &mut self,
        category: EntityCategory,
        excluded: &HashSet<EntityId>,
    ) -> Result<Entity> {
        match self.pool.draw(
            category,
            self.active_theme.as_ref(),
            excluded,
            &mut self.rng,
        ) {
            Ok(entity) => Ok(entity.clone()),
            Err(CoherenceError::EmptyPool { .. }) => {
                let fallback = self.default_entity(category)?;
                warn!(
                    category = category.label(),
                    fallback = %fallback.id,
                    excluded = excluded.len(),
                    "draw exhausted by exclusions; using documented default entity"
                );
                Ok(fallback)
            }
            Err(err) => Err(err),
        }
    }

    fn default_entity(&self, category: EntityCategory) -> Result<Entity> {
        if let Some(theme) = &self.active_theme {
            for id in &theme.core {
                if let Some(entity) = self.pool.get(id) {
                    if entity.category == category {
                        return Ok(entity.clone());
                    }
                }
            }
        }
        self.pool
            .first_of(category)
            .cloned()
            .ok_or_else(|| {
                CoherenceError::InvalidConfiguration(format!(
                    "no {} entities in pool",
                    category.label()
                ))
            })
    }

    fn note_entity_use(&mut self, entity: &Entity, role: UsageRole, section: &str) {
        self.position += 1;
        self.tracker.record_entity(UsageRecord {
            entity: entity.id.clone(),
            category: entity.category,
            role,
            position: self.position,
            section: section.to_string(),
        });
        self.pool.record_usage(
            &entity.id,
            &self.graph,
            self.active_theme.as_ref(),
            self.position,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::Entity;
    use crate::graph::RelationKind;
    use crate::input::RelationSpec;

    fn id(s: &str) -> EntityId {
        EntityId::from_display(s)
    }

    fn make_snapshot() -> KnowledgeSnapshot {
        let mut entities = vec![
            Entity::new("Jean Baudrillard", EntityCategory::Philosopher),
            Entity::new("Michel Foucault", EntityCategory::Philosopher),
            Entity::new("Donna Haraway", EntityCategory::Philosopher),
        ];
        for concept in [
            "simulacra",
            "hyperreality",
            "biopolitics",
            "discipline",
            "cyborg",
            "posthumanism",
        ] {
            entities.push(Entity::new(concept, EntityCategory::Concept));
        }
        for term in ["discourse", "subjectivity", "hegemony", "aporia"] {
            entities.push(Entity::new(term, EntityCategory::Term));
        }

        KnowledgeSnapshot {
            entities,
            themes: vec![Theme {
                key: "digital_subjectivity".to_string(),
                description: "Identity under computational mediation".to_string(),
                core: vec![id("cyborg"), id("posthumanism"), id("Donna Haraway")],
                associated: vec![id("subjectivity"), id("discourse")],
                context_phrases: vec!["in the context of networked life".to_string()],
                adjectives: vec!["algorithmic".to_string()],
            }],
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
            ],
            oppositions: vec![
                (id("simulacra"), id("discipline")),
                (id("cyborg"), id("biopolitics")),
            ],
            advocacies: vec![
                (id("Jean Baudrillard"), id("simulacra")),
                (id("Michel Foucault"), id("biopolitics")),
                (id("Michel Foucault"), id("discipline")),
                (id("Donna Haraway"), id("cyborg")),
            ],
        }
    }

    fn make_manager(seed: u64) -> CoherenceManager {
        CoherenceManager::new(
            make_snapshot(),
            Some("digital_subjectivity"),
            MetafictionLevel::Moderate,
            seed,
        )
        .unwrap()
    }

    #[test]
    fn test_unknown_theme_rejected() {
        let err = CoherenceManager::new(
            make_snapshot(),
            Some("nonexistent_theme"),
            MetafictionLevel::Subtle,
            1,
        )
        .unwrap_err();
        assert!(matches!(err, CoherenceError::InvalidConfiguration(_)));
    }

    #[test]
    fn test_select_subject_records_usage() {
        let mut mgr = make_manager(7);
        let entity = mgr.select_subject(EntityCategory::Concept, "introduction").unwrap();
        assert_eq!(entity.category, EntityCategory::Concept);

        let log = mgr.usage_tracker().entity_log();
        assert_eq!(log.len(), 1);
        assert_eq!(log[0].entity, entity.id);
        assert_eq!(log[0].role, UsageRole::Subject);
        // The draw decayed the pool copy, atomically with the selection.
        assert!(mgr.entity(&entity.id).unwrap().weight < 1.0);
    }

    #[test]
    fn test_select_related_prefers_neighbors() {
        let mut mgr = make_manager(11);
        for _ in 0..10 {
            let related = mgr
                .select_related(&id("biopolitics"), EntityCategory::Philosopher, "body")
                .unwrap();
            assert_eq!(related.id, id("Michel Foucault"));
        }
    }

    #[test]
    fn test_select_related_falls_back_without_neighbors() {
        let mut mgr = make_manager(11);
        // 'aporia' has no graph presence: plain theme-biased draw, never
        // the anchor itself.
        let related = mgr
            .select_related(&id("aporia"), EntityCategory::Term, "body")
            .unwrap();
        assert_ne!(related.id, id("aporia"));
        assert_eq!(related.category, EntityCategory::Term);
    }

    #[test]
    fn test_empty_pool_fallback_is_absorbed() {
        let mut mgr = make_manager(3);
        let excluded: HashSet<EntityId> = ["simulacra", "hyperreality", "biopolitics", "discipline", "cyborg", "posthumanism"]
            .iter()
            .map(|s| id(s))
            .collect();
        // Exclusions cover the whole category: the documented default (first
        // theme-core concept) comes back instead of an error.
        let entity = mgr
            .select_subject_excluding(EntityCategory::Concept, "body", &excluded)
            .unwrap();
        assert_eq!(entity.id, id("cyborg"));
    }

    #[test]
    fn test_determinism_same_seed_same_trace() {
        let run = |seed: u64| {
            let mut mgr = make_manager(seed);
            for i in 0..5 {
                let _ = mgr.next_dialectical_stage(i).unwrap();
                let subject = mgr.select_subject(EntityCategory::Concept, "body").unwrap();
                let _ = mgr.select_related(&subject.id, EntityCategory::Philosopher, "body");
                let _ = mgr.decide_metafiction("the *cyborg* is always already written", i);
            }
            mgr.usage_tracker().selection_trace()
        };

        assert_eq!(run(38), run(38));
        assert_ne!(run(38), run(39));
    }

    #[test]
    fn test_dialectical_scenario_five_sections() {
        // Five sections: thesis, antithesis, synthesis, thesis, antithesis,
        // with the fourth thesis equal to the third synthesis.
        let mut mgr = make_manager(38);
        let mut stages = Vec::new();
        let mut concepts = Vec::new();
        for i in 0..5 {
            let (stage, concept) = mgr.next_dialectical_stage(i).unwrap();
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
        assert_eq!(concepts[3], concepts[2]);
    }

    #[test]
    fn test_snapshot_restore_roundtrip() {
        let mut mgr = make_manager(21);
        let _ = mgr.select_subject(EntityCategory::Concept, "introduction").unwrap();
        let snapshot = mgr.snapshot();
        let trace_before = mgr.usage_tracker().selection_trace();

        // Speculative work...
        for i in 0..3 {
            let _ = mgr.next_dialectical_stage(i).unwrap();
            let _ = mgr.select_subject(EntityCategory::Term, "body").unwrap();
            let _ = mgr.decide_metafiction("always *simulacra*", i);
        }
        assert_ne!(mgr.usage_tracker().selection_trace(), trace_before);

        // ...rolled back.
        mgr.restore(snapshot).unwrap();
        assert_eq!(mgr.usage_tracker().selection_trace(), trace_before);
        assert_eq!(mgr.usage_tracker().metafiction_count(), 0);
    }

    #[test]
    fn test_restore_replays_identical_randomness() {
        let mut mgr = make_manager(5);
        let snapshot = mgr.snapshot();

        let first: Vec<EntityId> = (0..4)
            .map(|_| mgr.select_subject(EntityCategory::Concept, "body").unwrap().id)
            .collect();

        mgr.restore(snapshot).unwrap();
        let second: Vec<EntityId> = (0..4)
            .map(|_| mgr.select_subject(EntityCategory::Concept, "body").unwrap().id)
            .collect();

        assert_eq!(first, second);
    }

    #[test]
    fn test_restore_foreign_snapshot_rejected() {
        let mgr_a = make_manager(1);
        let mut mgr_b = make_manager(1);
        let err = mgr_b.restore(mgr_a.snapshot()).unwrap_err();
        assert!(matches!(err, CoherenceError::StateCorruption(_)));
    }

    #[test]
    fn test_restore_idempotent_immediately_after_snapshot() {
        let mut mgr = make_manager(13);
        let _ = mgr.select_subject(EntityCategory::Concept, "introduction").unwrap();

        let weights_before: Vec<f64> = mgr.pool.iter().map(|e| e.weight).collect();
        let trace_before = mgr.usage_tracker().selection_trace();
        let snapshot = mgr.snapshot();
        mgr.restore(snapshot).unwrap();

        let weights_after: Vec<f64> = mgr.pool.iter().map(|e| e.weight).collect();
        assert_eq!(weights_before, weights_after);
        assert_eq!(mgr.usage_tracker().selection_trace(), trace_before);
    }

    #[test]
    fn test_metafiction_ceiling_over_long_run() {
        let mut mgr = make_manager(17);
        let ceiling = mgr.metafiction_level().max_insertions();
        let mut insertions = 0;
        for i in 0..400 {
            let decision =
                mgr.decide_metafiction("always necessarily *power* *cyborg* inevitably", i);
            if decision.insert {
                insertions += 1;
            }
        }
        assert!(insertions <= ceiling, "{insertions} insertions over ceiling {ceiling}");
        assert_eq!(mgr.usage_tracker().metafiction_count(), insertions);
    }

    #[test]
    fn test_metafiction_spacing_over_long_run() {
        let mut mgr = make_manager(23);
        let mut last: Option<usize> = None;
        for i in 0..400 {
            let decision =
                mgr.decide_metafiction("always necessarily *power* *cyborg* inevitably", i);
            if decision.insert {
                if let Some(prev) = last {
                    assert!(
                        i - prev >= MIN_METAFICTION_SPACING,
                        "insertions at {prev} and {i} violate spacing"
                    );
                }
                last = Some(i);
            }
        }
    }

    #[test]
    fn test_usage_summary_reflects_selections() {
        let mut mgr = make_manager(29);
        let subject = mgr.select_subject(EntityCategory::Concept, "introduction").unwrap();
        let _ = mgr
            .select_related(&subject.id, EntityCategory::Philosopher, "introduction")
            .unwrap();

        let summary = mgr.usage_summary();
        assert_eq!(summary.concepts.iter().map(|(_, n)| n).sum::<usize>(), 1);
        assert_eq!(summary.philosophers.iter().map(|(_, n)| n).sum::<usize>(), 1);
        assert_eq!(summary.metafiction_insertions, 0);
    }
}
