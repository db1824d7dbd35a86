//! The essay driver: title, abstract, dialectically staged body sections,
//! conclusion, notes, and works cited, all through the coherence facade.

use anyhow::{Context, Result};
use pomo_core::{CoherenceManager, EntityCategory, MetafictionLevel, Stage};
use pomo_kb::KnowledgeBase;
use tracing::debug;

use crate::metaphrase;
use crate::notes::{self, NoteSystem};
use crate::paragraph;
use crate::sentence;

pub struct EssayOptions {
    pub seed: u64,
    pub theme: String,
    pub level: MetafictionLevel,
    pub sections: usize,
}

pub struct Essay {
    pub title: String,
    pub markdown: String,
    pub seed: u64,
    pub theme: String,
}

/// Generate a complete essay. Consumes the knowledge base; one call per run.
pub fn generate(kb: KnowledgeBase, opts: &EssayOptions) -> Result<Essay> {
    let KnowledgeBase {
        snapshot,
        key_works,
        quotes,
    } = kb;

    let mut mgr = CoherenceManager::new(snapshot, Some(&opts.theme), opts.level, opts.seed)
        .context("failed to initialize coherence engine")?;
    let mut note_system = NoteSystem::new();
    let mut paragraph_index = 0usize;

    let title = make_title(&mut mgr)?;

    let mut parts: Vec<String> = Vec::new();
    parts.push(format!("# {title}\n"));

    // Abstract.
    parts.push("## Abstract\n".to_string());
    parts.push(make_abstract(&mut mgr)?);

    // Introduction.
    let intro_anchor = mgr
        .select_subject(EntityCategory::Concept, "introduction")?
        .id;
    let intro_sentences = 5 + mgr.pick_index(3);
    let mut intro = paragraph::generate(
        &mut mgr,
        &quotes,
        &key_works,
        &mut note_system,
        "introduction",
        &intro_anchor,
        intro_sentences,
        true,
    )?;
    intro = maybe_splice(&mut mgr, intro, paragraph_index);
    paragraph_index += 1;
    parts.push("## Introduction\n".to_string());
    parts.push(format!("{intro}\n"));

    // Body sections, one dialectical stage each.
    for section_index in 0..opts.sections {
        let (stage, concept) = mgr
            .next_dialectical_stage(section_index)
            .context("dialectical advance failed")?;
        debug!(section = section_index, stage = stage.label(), concept = %concept.id, "section opened");

        let section_label = format!("section-{section_index}");
        let section_title = make_section_title(&mut mgr, stage, &concept.display)?;
        parts.push(format!("## {section_title}\n"));

        let paragraphs = 2 + mgr.pick_index(2);
        for p in 0..paragraphs {
            let sentences = 5 + mgr.pick_index(4);
            let mut text = paragraph::generate(
                &mut mgr,
                &quotes,
                &key_works,
                &mut note_system,
                &section_label,
                &concept.id,
                sentences,
                p == 0,
            )?;
            text = maybe_splice(&mut mgr, text, paragraph_index);
            paragraph_index += 1;
            parts.push(format!("{text}\n"));
        }
    }

    // Conclusion, drawn from what the essay actually used.
    let summary = mgr.usage_summary();
    let top_concept = summary
        .concepts
        .first()
        .and_then(|(id, _)| mgr.entity(id))
        .map(|e| e.display.clone())
        .unwrap_or_else(|| "the problem at hand".to_string());
    let top_term = summary
        .terms
        .first()
        .and_then(|(id, _)| mgr.entity(id))
        .map(|e| e.display.clone())
        .unwrap_or_else(|| "discourse".to_string());

    let conclusion_anchor = mgr
        .select_subject(EntityCategory::Concept, "conclusion")?
        .id;
    let conclusion_sentences = 4 + mgr.pick_index(3);
    let mut conclusion = paragraph::generate(
        &mut mgr,
        &quotes,
        &key_works,
        &mut note_system,
        "conclusion",
        &conclusion_anchor,
        conclusion_sentences,
        true,
    )?;
    if mgr.conclusion_metafiction() {
        let closing = metaphrase::conclusion(&mut mgr, &top_concept, &top_term);
        conclusion = format!("{conclusion} {closing}");
    }
    parts.push("## Conclusion\n".to_string());
    parts.push(format!("{conclusion}\n"));

    // Notes precede works cited.
    if let Some(rendered) = note_system.render() {
        parts.push(rendered);
    }
    if let Some(cited) = notes::works_cited(&mut mgr, &key_works) {
        parts.push(cited);
    }

    let markdown = parts.join("\n");
    Ok(Essay {
        title,
        markdown,
        seed: opts.seed,
        theme: opts.theme.clone(),
    })
}

fn maybe_splice(mgr: &mut CoherenceManager, text: String, paragraph_index: usize) -> String {
    let decision = mgr.decide_metafiction(&text, paragraph_index);
    match (decision.insert, decision.category) {
        (true, Some(category)) => {
            let cast = match sentence::cast(mgr, "metafiction", None) {
                Ok(cast) => cast,
                Err(_) => return text,
            };
            let phrase = metaphrase::render(
                mgr,
                category,
                &cast.concept.display,
                &cast.term.display,
                &cast.philosopher.display,
            );
            paragraph::splice_metafiction(mgr, &text, &phrase)
        }
        _ => text,
    }
}

fn make_title(mgr: &mut CoherenceManager) -> Result<String> {
    let (first, second) = sentence::title_pair(mgr)?;
    let term = mgr.select_related(&first.id, EntityCategory::Term, "title")?;

    let first = &first.display;
    let second = &second.display;
    let term = &term.display;

    let title = match mgr.pick_index(6) {
        0 => format!("The Dialectic of {first}: Rethinking {term}"),
        1 => format!("{first} and {term}: Beyond {second}"),
        2 => format!("Deconstructing {first}: {term} in the Age of {second}"),
        3 => format!("The Impossibility of {term}: {first} and Its Discontents"),
        4 => format!("Reading {first} Against {second}: Toward a Theory of {term}"),
        _ => format!("After {first}: {term} in the Era of {second}"),
    };
    Ok(title_case(&title))
}

fn make_section_title(mgr: &mut CoherenceManager, stage: Stage, concept: &str) -> Result<String> {
    let philosopher = mgr.select_subject(EntityCategory::Philosopher, "section-title")?;
    let philosopher = &philosopher.display;

    let title = match stage {
        Stage::Thesis => match mgr.pick_index(3) {
            0 => format!("{philosopher} and the Politics of {concept}"),
            1 => format!("The Question of {concept}"),
            _ => format!("Situating {concept} After {philosopher}"),
        },
        Stage::Antithesis => match mgr.pick_index(3) {
            0 => format!("Against {concept}: A Counter-Reading"),
            1 => format!("{concept} and Its Others"),
            _ => format!("Contra {philosopher}: The Limits of {concept}"),
        },
        Stage::Synthesis => match mgr.pick_index(3) {
            0 => format!("Toward {concept}: A Provisional Synthesis"),
            1 => format!("{concept} as Horizon"),
            _ => format!("Rethinking {concept} with {philosopher}"),
        },
    };
    Ok(title_case(&title))
}

fn make_abstract(mgr: &mut CoherenceManager) -> Result<String> {
    let opening = sentence::declarative(mgr, "abstract", None)?;
    let middle = sentence::declarative(mgr, "abstract", None)?;
    let closing = sentence::question(mgr, "abstract", None)?;

    let keywords: Vec<String> = match mgr.active_theme() {
        Some(theme) => theme
            .core
            .iter()
            .chain(theme.associated.iter())
            .filter_map(|id| mgr.entity(id))
            .filter(|e| e.category != EntityCategory::Philosopher)
            .take(5)
            .map(|e| e.display.clone())
            .collect(),
        None => Vec::new(),
    };

    let mut out = format!("{opening} {middle} {closing}\n");
    if !keywords.is_empty() {
        out.push_str(&format!("\n**Keywords:** {}\n", keywords.join(", ")));
    }
    Ok(out)
}

/// Headline-style capitalization, leaving short connective words lower.
fn title_case(raw: &str) -> String {
    const LOWERCASE_WORDS: [&str; 12] = [
        "a", "an", "and", "as", "at", "in", "its", "of", "the", "toward", "with", "after",
    ];
    let mut out: Vec<String> = Vec::new();
    for (index, word) in raw.split(' ').enumerate() {
        let keep_lower = index != 0
            && LOWERCASE_WORDS.contains(&word.to_lowercase().as_str())
            && !word.chars().next().is_some_and(|c| c.is_uppercase());
        if keep_lower {
            out.push(word.to_string());
        } else {
            let mut chars = word.chars();
            let capitalized = match chars.next() {
                Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
                None => String::new(),
            };
            out.push(capitalized);
        }
    }
    out.join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options(seed: u64) -> EssayOptions {
        EssayOptions {
            seed,
            theme: "digital_subjectivity".to_string(),
            level: MetafictionLevel::Moderate,
            sections: 4,
        }
    }

    #[test]
    fn test_title_case() {
        assert_eq!(
            title_case("the dialectic of simulacra: rethinking discourse"),
            "The Dialectic of Simulacra: Rethinking Discourse"
        );
    }

    #[test]
    fn test_generate_structure() {
        let kb = KnowledgeBase::bundled().unwrap();
        let essay = generate(kb, &options(38)).unwrap();

        assert!(essay.markdown.starts_with("# "));
        assert!(essay.markdown.contains("## Abstract"));
        assert!(essay.markdown.contains("## Introduction"));
        assert!(essay.markdown.contains("## Conclusion"));
        assert!(essay.markdown.contains("## Works Cited"));
        // One heading per body section on top of the four fixed ones.
        let headings = essay.markdown.matches("\n## ").count();
        assert!(headings >= 4 + 4 - 1, "headings: {headings}");
    }

    #[test]
    fn test_generate_deterministic() {
        let first = generate(KnowledgeBase::bundled().unwrap(), &options(38)).unwrap();
        let second = generate(KnowledgeBase::bundled().unwrap(), &options(38)).unwrap();
        assert_eq!(first.markdown, second.markdown);
    }

    #[test]
    fn test_different_seeds_differ() {
        let first = generate(KnowledgeBase::bundled().unwrap(), &options(38)).unwrap();
        let second = generate(KnowledgeBase::bundled().unwrap(), &options(39)).unwrap();
        assert_ne!(first.markdown, second.markdown);
    }

    #[test]
    fn test_unknown_theme_fails_before_generation() {
        let kb = KnowledgeBase::bundled().unwrap();
        let mut opts = options(1);
        opts.theme = "nonexistent".to_string();
        assert!(generate(kb, &opts).is_err());
    }
}
