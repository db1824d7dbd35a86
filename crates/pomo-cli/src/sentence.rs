//! Template-driven sentence realization over the coherence facade.
//!
//! Every entity slot is filled through `select_subject`/`select_related`,
//! with in-sentence exclusions so the same entity never plays two roles in
//! one sentence. Terms are wrapped in `*...*` markers; the placement decider
//! reads that density downstream.

use std::collections::{BTreeMap, HashSet};

use anyhow::Result;
use pomo_core::{CoherenceManager, Entity, EntityCategory, EntityId};

/// The entity triple most sentences are built from.
pub struct SentenceCast {
    pub concept: Entity,
    pub term: Entity,
    pub philosopher: Entity,
}

/// Draw a concept (or reuse the anchor), then a term and philosopher biased
/// toward it, excluding earlier picks within the sentence.
pub fn cast(
    mgr: &mut CoherenceManager,
    section: &str,
    anchor: Option<&EntityId>,
) -> Result<SentenceCast> {
    let concept = match anchor.and_then(|id| mgr.entity(id).cloned()) {
        Some(entity) => entity,
        None => mgr.select_subject(EntityCategory::Concept, section)?,
    };
    let term = mgr.select_related(&concept.id, EntityCategory::Term, section)?;
    let philosopher = mgr.select_related(&concept.id, EntityCategory::Philosopher, section)?;
    Ok(SentenceCast {
        concept,
        term,
        philosopher,
    })
}

/// Opening sentence of a section, weaving in a theme context phrase when
/// the active theme supplies one.
pub fn opening(mgr: &mut CoherenceManager, section: &str, anchor: &EntityId) -> Result<String> {
    let context_phrase = mgr.active_theme().and_then(|theme| {
        if theme.context_phrases.is_empty() {
            None
        } else {
            Some(theme.context_phrases.clone())
        }
    });
    let phrase = match context_phrase {
        Some(phrases) => {
            let idx = mgr.pick_index(phrases.len());
            Some(phrases[idx].clone())
        }
        None => None,
    };

    let cast = cast(mgr, section, Some(anchor))?;
    let concept = &cast.concept.display;
    let term = &cast.term.display;
    let philosopher = &cast.philosopher.display;

    let sentence = match mgr.pick_index(4) {
        0 => match &phrase {
            Some(p) => format!(
                "Any reckoning with {concept} must begin {p}, where *{term}* acquires its contemporary urgency."
            ),
            None => format!(
                "Any reckoning with {concept} must begin with *{term}* and its contemporary urgency."
            ),
        },
        1 => format!(
            "For {philosopher}, {concept} is never a neutral descriptor but a site where *{term}* is contested."
        ),
        2 => match &phrase {
            Some(p) => format!(
                "{p}, the question of {concept} returns with renewed force, inseparable from *{term}*."
            )
            .char_indices()
            .map(|(i, c)| if i == 0 { c.to_ascii_uppercase() } else { c })
            .collect::<String>(),
            None => format!(
                "The question of {concept} returns with renewed force, inseparable from *{term}*."
            ),
        },
        _ => format!(
            "{philosopher}'s account of {concept} offers a point of departure for rethinking *{term}*."
        ),
    };
    Ok(sentence)
}

/// A declarative body sentence.
pub fn declarative(
    mgr: &mut CoherenceManager,
    section: &str,
    anchor: Option<&EntityId>,
) -> Result<String> {
    let cast = cast(mgr, section, anchor)?;
    let concept = &cast.concept.display;
    let term = &cast.term.display;
    let philosopher = &cast.philosopher.display;

    let adjective = theme_adjective(mgr);

    let sentence = match mgr.pick_index(7) {
        0 => format!(
            "{philosopher} reminds us that {concept} operates less as a stable referent than as a {adjective} field in which *{term}* is produced."
        ),
        1 => format!(
            "The logic of {concept} is thus inseparable from the {adjective} workings of *{term}*."
        ),
        2 => format!(
            "What {philosopher} names {concept} designates precisely the impossibility of holding *{term}* at a distance."
        ),
        3 => format!(
            "Read through {concept}, *{term}* appears not as a given but as an effect of {adjective} mediation."
        ),
        4 => format!(
            "Here {concept} functions as the hinge upon which any {adjective} account of *{term}* must turn."
        ),
        5 => format!(
            "It is in this sense that {philosopher}'s {concept} anticipates the {adjective} condition of *{term}*."
        ),
        _ => format!(
            "{concept} and *{term}* are bound together in a relation neither of identity nor of simple opposition."
        ),
    };
    Ok(sentence)
}

/// An interrogative sentence, used sparingly for rhythm.
pub fn question(mgr: &mut CoherenceManager, section: &str, anchor: Option<&EntityId>) -> Result<String> {
    let cast = cast(mgr, section, anchor)?;
    let concept = &cast.concept.display;
    let term = &cast.term.display;

    let sentence = match mgr.pick_index(3) {
        0 => format!("What would it mean to think {concept} without recourse to *{term}*?"),
        1 => format!("Can *{term}* survive its own implication in {concept}?"),
        _ => format!("Where, then, does {concept} end and *{term}* begin?"),
    };
    Ok(sentence)
}

/// A quotation sentence when the knowledge base supplies a quote for a
/// philosopher tied to the anchor; otherwise a key-work citation sentence.
pub fn quotation(
    mgr: &mut CoherenceManager,
    quotes: &BTreeMap<EntityId, Vec<String>>,
    key_works: &BTreeMap<EntityId, Vec<(String, u32)>>,
    section: &str,
    anchor: Option<&EntityId>,
) -> Result<String> {
    let cast = cast(mgr, section, anchor)?;
    let concept = &cast.concept.display;
    let philosopher = &cast.philosopher;

    if let Some(lines) = quotes.get(&philosopher.id) {
        if !lines.is_empty() {
            let quote = &lines[mgr.pick_index(lines.len())];
            return Ok(format!(
                "As {} puts it, \"{}\" -- a formulation that bears directly on {}.",
                philosopher.display, quote, concept
            ));
        }
    }

    if let Some(works) = key_works.get(&philosopher.id) {
        if !works.is_empty() {
            let (title, year) = &works[mgr.pick_index(works.len())];
            return Ok(format!(
                "{}'s *{}* ({}) remains the decisive treatment of {}.",
                philosopher.display, title, year, concept
            ));
        }
    }

    Ok(format!(
        "{}'s treatment of {} has shaped the entire subsequent debate.",
        philosopher.display, concept
    ))
}

/// Draw two distinct concepts for title work, excluding each other.
pub fn title_pair(mgr: &mut CoherenceManager) -> Result<(Entity, Entity)> {
    let first = mgr.select_subject(EntityCategory::Concept, "title")?;
    let mut excluded = HashSet::new();
    excluded.insert(first.id.clone());
    let second = mgr.select_subject_excluding(EntityCategory::Concept, "title", &excluded)?;
    Ok((first, second))
}

fn theme_adjective(mgr: &mut CoherenceManager) -> String {
    let adjectives = mgr
        .active_theme()
        .map(|t| t.adjectives.clone())
        .filter(|a| !a.is_empty());
    match adjectives {
        Some(list) => list[mgr.pick_index(list.len())].clone(),
        None => "discursive".to_string(),
    }
}
