//! Paragraph assembly and metafiction splicing.

use std::collections::BTreeMap;

use anyhow::Result;
use pomo_core::{CoherenceManager, EntityId};

use crate::metaphrase;
use crate::notes::NoteSystem;
use crate::sentence;

/// Probability that a body sentence carries an endnote marker.
const NOTE_CHANCE: f64 = 0.2;

/// Assemble one paragraph of `sentence_count` sentences anchored on a
/// concept, mixing declaratives with occasional quotations and questions.
pub fn generate(
    mgr: &mut CoherenceManager,
    quotes: &BTreeMap<EntityId, Vec<String>>,
    key_works: &BTreeMap<EntityId, Vec<(String, u32)>>,
    notes: &mut NoteSystem,
    section: &str,
    anchor: &EntityId,
    sentence_count: usize,
    lead: bool,
) -> Result<String> {
    let mut sentences: Vec<String> = Vec::new();

    for index in 0..sentence_count {
        let mut text = if index == 0 && lead {
            sentence::opening(mgr, section, anchor)?
        } else {
            // Anchor the first half of the paragraph, then drift.
            let anchored = if index < sentence_count / 2 {
                Some(anchor)
            } else {
                None
            };
            match mgr.pick_index(10) {
                0..=5 => sentence::declarative(mgr, section, anchored)?,
                6 | 7 => sentence::quotation(mgr, quotes, key_works, section, anchored)?,
                8 => sentence::question(mgr, section, anchored)?,
                _ => sentence::declarative(mgr, section, anchored)?,
            }
        };

        // Questions read badly with a footnote hanging off them.
        if !text.ends_with('?') && mgr.chance(NOTE_CHANCE) {
            let cast = sentence::cast(mgr, section, Some(anchor))?;
            let marker = notes.add_note(
                mgr,
                &cast.concept.display,
                &cast.term.display,
                &cast.philosopher.display,
            );
            text = format!("{}[^{}]", text, marker);
        }

        sentences.push(text);
    }

    Ok(sentences.join(" "))
}

/// Splice a metafictional sentence into a paragraph.
///
/// Paragraphs that already read as self-referential are left alone. Short
/// paragraphs take the phrase at the end; longer ones take it at a seeded
/// position in their second half.
pub fn splice_metafiction(
    mgr: &mut CoherenceManager,
    paragraph: &str,
    phrase: &str,
) -> String {
    if metaphrase::is_self_referential(paragraph) {
        return paragraph.to_string();
    }

    let sentences: Vec<&str> = paragraph.split_inclusive(". ").collect();
    if sentences.len() <= 2 {
        return format!("{} {}", paragraph, phrase);
    }

    let lower = sentences.len() / 2;
    let insert_at = lower + mgr.pick_index(sentences.len() - lower);

    let mut out = String::new();
    for (i, chunk) in sentences.iter().enumerate() {
        if i == insert_at {
            out.push_str(phrase);
            out.push(' ');
        }
        out.push_str(chunk);
    }
    out
}
