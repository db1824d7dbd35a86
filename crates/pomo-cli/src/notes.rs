//! Endnotes and works-cited assembly.
//!
//! Note categories rotate through the tracker's note stream so consecutive
//! notes vary in register; the works-cited list is assembled from the run's
//! usage summary, so it cites exactly the philosophers that appeared.

use std::collections::BTreeMap;

use pomo_core::{CoherenceManager, EntityId};
use pomo_core::constants::NOTE_RECENCY_WINDOW;

pub const NOTE_CATEGORIES: [&str; 4] = [
    "terminological",
    "historical",
    "methodological",
    "intertextual",
];

struct Note {
    marker: usize,
    text: String,
}

/// Collects endnotes during generation and renders them at the end.
#[derive(Default)]
pub struct NoteSystem {
    notes: Vec<Note>,
}

impl NoteSystem {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.notes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }

    /// Add a note about the given cast and return its footnote marker.
    ///
    /// The category avoids the most recently used ones (read from the
    /// manager's note stream) and is recorded back into it.
    pub fn add_note(
        &mut self,
        mgr: &mut CoherenceManager,
        concept: &str,
        term: &str,
        philosopher: &str,
    ) -> usize {
        let recent = mgr.recent_note_categories(NOTE_RECENCY_WINDOW);
        let fresh: Vec<&str> = NOTE_CATEGORIES
            .iter()
            .copied()
            .filter(|c| !recent.iter().any(|r| r == c))
            .collect();
        let pool = if fresh.is_empty() {
            NOTE_CATEGORIES.to_vec()
        } else {
            fresh
        };
        let category = pool[mgr.pick_index(pool.len())];
        mgr.record_note_category(category);

        let text = match category {
            "terminological" => format!(
                "The term *{term}* is used here in its post-structuralist sense, not to be conflated with its everyday usage."
            ),
            "historical" => format!(
                "The debate over {concept} dates to the reception of {philosopher}'s early seminars, well before its canonization."
            ),
            "methodological" => format!(
                "The present reading brackets the empirical literature on {concept} in favor of its conceptual grammar."
            ),
            _ => format!(
                "See also the adjacent discussion of *{term}* in the commentary surrounding {philosopher}'s later work."
            ),
        };

        let marker = self.notes.len() + 1;
        self.notes.push(Note { marker, text });
        marker
    }

    /// Render the notes section, or nothing if no notes were taken.
    pub fn render(&self) -> Option<String> {
        if self.notes.is_empty() {
            return None;
        }
        let mut out = String::from("## Notes\n\n");
        for note in &self.notes {
            out.push_str(&format!("[^{}]: {}\n", note.marker, note.text));
        }
        out.push('\n');
        Some(out)
    }
}

/// Assemble the works-cited section from the run's usage summary: one entry
/// per philosopher that actually appeared, alphabetized by surname-first
/// form, choosing each entry's work through the run's seeded generator.
pub fn works_cited(
    mgr: &mut CoherenceManager,
    key_works: &BTreeMap<EntityId, Vec<(String, u32)>>,
) -> Option<String> {
    let summary = mgr.usage_summary();
    if summary.philosophers.is_empty() {
        return None;
    }

    let mut entries: Vec<String> = Vec::new();
    for (id, _count) in &summary.philosophers {
        let Some(display) = mgr.entity(id).map(|e| e.display.clone()) else {
            continue;
        };
        let entry = match key_works.get(id) {
            Some(works) if !works.is_empty() => {
                let (title, year) = &works[mgr.pick_index(works.len())];
                format!("{}. *{}*. {}.", invert_name(&display), title, year)
            }
            _ => format!("{}. *Collected Interventions*. n.d.", invert_name(&display)),
        };
        entries.push(entry);
    }

    entries.sort();
    entries.dedup();

    let mut out = String::from("## Works Cited\n\n");
    for entry in entries {
        out.push_str(&entry);
        out.push_str("\n\n");
    }
    Some(out)
}

/// "Jean Baudrillard" -> "Baudrillard, Jean". Single-word names pass
/// through unchanged.
fn invert_name(display: &str) -> String {
    match display.rsplit_once(' ') {
        Some((given, family)) => format!("{family}, {given}"),
        None => display.to_string(),
    }
}
