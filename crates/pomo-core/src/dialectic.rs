//! Thesis/antithesis/synthesis progression across essay sections.

use std::collections::HashSet;

use rand::rngs::SmallRng;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::entity::{EntityCategory, EntityId};
use crate::error::{CoherenceError, Result};
use crate::graph::{ConceptGraph, RelationKind};
use crate::pool::EntityPool;
use crate::theme::Theme;

/// Argumentative stage of the current triad.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Thesis,
    Antithesis,
    Synthesis,
}

impl Stage {
    pub fn next(self) -> Stage {
        match self {
            Stage::Thesis => Stage::Antithesis,
            Stage::Antithesis => Stage::Synthesis,
            Stage::Synthesis => Stage::Thesis,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Stage::Thesis => "thesis",
            Stage::Antithesis => "antithesis",
            Stage::Synthesis => "synthesis",
        }
    }
}

/// State machine advancing one dialectical stage per section.
///
/// Stages strictly cycle thesis → antithesis → synthesis; there are no
/// backward transitions and no skipping. A completed triad reopens as a new
/// thesis seeded by the prior synthesis, chaining dialectical movement
/// across the essay.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct DialecticalProgressor {
    stage: Option<Stage>,
    thesis: Option<EntityId>,
    antithesis: Option<EntityId>,
    synthesis: Option<EntityId>,
    triads_completed: u32,
}

impl DialecticalProgressor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current_stage(&self) -> Option<Stage> {
        self.stage
    }

    pub fn thesis(&self) -> Option<&EntityId> {
        self.thesis.as_ref()
    }

    pub fn antithesis(&self) -> Option<&EntityId> {
        self.antithesis.as_ref()
    }

    pub fn triads_completed(&self) -> u32 {
        self.triads_completed
    }

    /// Advance to the next stage and return it with the concept organizing
    /// the new section.
    pub fn advance(
        &mut self,
        pool: &EntityPool,
        graph: &ConceptGraph,
        theme: Option<&Theme>,
        rng: &mut SmallRng,
    ) -> Result<(Stage, EntityId)> {
        let next = match self.stage {
            None => Stage::Thesis,
            Some(stage) => stage.next(),
        };

        let concept = match next {
            Stage::Thesis => self.open_thesis(pool, theme, rng)?,
            Stage::Antithesis => self.oppose_thesis(pool, graph, theme, rng)?,
            Stage::Synthesis => self.synthesize(pool, graph, theme, rng)?,
        };

        self.stage = Some(next);
        Ok((next, concept))
    }

    fn open_thesis(
        &mut self,
        pool: &EntityPool,
        theme: Option<&Theme>,
        rng: &mut SmallRng,
    ) -> Result<EntityId> {
        let thesis = match self.synthesis.take() {
            // Chaining: the prior synthesis opens the next movement.
            Some(prior) => {
                self.triads_completed += 1;
                prior
            }
            None => pool
                .draw(EntityCategory::Concept, theme, &HashSet::new(), rng)?
                .id
                .clone(),
        };
        self.thesis = Some(thesis.clone());
        self.antithesis = None;
        Ok(thesis)
    }

    fn oppose_thesis(
        &mut self,
        pool: &EntityPool,
        graph: &ConceptGraph,
        theme: Option<&Theme>,
        rng: &mut SmallRng,
    ) -> Result<EntityId> {
        let thesis = self.thesis.clone().ok_or_else(|| {
            CoherenceError::StateCorruption("antithesis advance without a thesis".to_string())
        })?;

        let antithesis = match graph.oppositional_concept_of(&thesis) {
            Some(opposite) => opposite.clone(),
            None => {
                // No curated pair and no critiques edge: substitute an
                // unrelated concept from the theme, excluding the thesis and
                // everything connected to it.
                debug!(thesis = %thesis, "no opposition found; drawing unrelated theme concept");
                let mut excluded: HashSet<EntityId> =
                    graph.neighbors(&thesis).into_iter().collect();
                excluded.insert(thesis.clone());
                match pool.draw(EntityCategory::Concept, theme, &excluded, rng) {
                    Ok(entity) => entity.id.clone(),
                    Err(CoherenceError::EmptyPool { .. }) => {
                        // Neighbor exclusion emptied the category; retry
                        // excluding only the thesis itself.
                        warn!(thesis = %thesis, "unrelated-concept fallback exhausted the pool; retrying without neighbor exclusion");
                        let excluded = HashSet::from([thesis.clone()]);
                        pool.draw(EntityCategory::Concept, theme, &excluded, rng)?
                            .id
                            .clone()
                    }
                    Err(err) => return Err(err),
                }
            }
        };

        debug_assert_ne!(antithesis, thesis);
        self.antithesis = Some(antithesis.clone());
        Ok(antithesis)
    }

    fn synthesize(
        &mut self,
        pool: &EntityPool,
        graph: &ConceptGraph,
        theme: Option<&Theme>,
        rng: &mut SmallRng,
    ) -> Result<EntityId> {
        let thesis = self.thesis.clone().ok_or_else(|| {
            CoherenceError::StateCorruption("synthesis advance without a thesis".to_string())
        })?;
        let antithesis = self.antithesis.clone().ok_or_else(|| {
            CoherenceError::StateCorruption("synthesis advance without an antithesis".to_string())
        })?;

        // Candidates: complements / is_foundational_to edges off either pole,
        // strongest-first per pole, thesis pole first.
        let mut candidates: Vec<EntityId> = Vec::new();
        for pole in [&thesis, &antithesis] {
            for relation in graph.relations_of(pole) {
                if matches!(
                    relation.kind,
                    RelationKind::Complements | RelationKind::IsFoundationalTo
                ) && relation.target != thesis
                    && relation.target != antithesis
                    && !candidates.contains(&relation.target)
                {
                    candidates.push(relation.target.clone());
                }
            }
        }

        let synthesis = if candidates.is_empty() {
            debug!(thesis = %thesis, antithesis = %antithesis, "no synthesis relation; drawing theme-biased concept");
            let excluded = HashSet::from([thesis.clone(), antithesis.clone()]);
            match pool.draw(EntityCategory::Concept, theme, &excluded, rng) {
                Ok(entity) => entity.id.clone(),
                Err(CoherenceError::EmptyPool { .. }) => {
                    // Only the two poles exist. Fold the movement back onto
                    // its thesis rather than abort the run.
                    warn!(thesis = %thesis, "synthesis fallback exhausted the pool; reusing the thesis");
                    thesis.clone()
                }
                Err(err) => return Err(err),
            }
        } else {
            pool.draw_from(&candidates, EntityCategory::Concept, theme, &HashSet::new(), rng)?
                .id
                .clone()
        };

        self.synthesis = Some(synthesis.clone());
        Ok(synthesis)
    }
}
