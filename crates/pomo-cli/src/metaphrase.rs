//! Metafictional phrase realization, one template family per category.
//!
//! The engine decides *whether* and *what kind*; this module only renders
//! the chosen category into a sentence, with every template pick routed
//! through the run's seeded generator.

use pomo_core::{CoherenceManager, MetafictionCategory};

/// Render a metafictional sentence of the given category.
pub fn render(
    mgr: &mut CoherenceManager,
    category: MetafictionCategory,
    concept: &str,
    term: &str,
    philosopher: &str,
) -> String {
    match category {
        MetafictionCategory::Complicity => {
            let templates = [
                format!("Writing about {concept} and *{term}* necessarily involves a certain disciplinary complicity."),
                format!("In theorizing *{term}*, this analysis participates in the economy of {concept} it seeks to interrogate."),
                format!("This text, in attempting to analyze *{term}*, becomes yet another instance of academic {concept}."),
            ];
            pick(mgr, templates)
        }
        MetafictionCategory::Reflexivity => {
            let templates = [
                format!("The reflexive awareness that {concept} both enables and delimits this analysis does not escape the author."),
                format!("This paragraph, in its attempt to elucidate *{term}*, performs the very {concept} it describes."),
                format!("{philosopher} might note that this very paragraph enacts the logic of {concept} it sets out to examine."),
            ];
            pick(mgr, templates)
        }
        MetafictionCategory::Paradox => {
            let templates = [
                format!("Even as we critique {concept}, we cannot escape its structuring effects on our account of *{term}*."),
                format!("The paradox is that any rigorous treatment of *{term}* is already caught within the web of {concept}."),
                format!("To name {concept} at all is to reinstate the *{term}* the naming was meant to suspend."),
            ];
            pick(mgr, templates)
        }
        MetafictionCategory::MethodDoubt => {
            let templates = [
                format!("It bears asking whether this reading of {concept} merely reproduces the paradigms it inherits."),
                format!("The methodology employed here is implicated in the structures of *{term}* it attempts to analyze."),
                format!("To what extent can an investigation of {concept} escape the very logic it seeks to critique?"),
            ];
            pick(mgr, templates)
        }
        MetafictionCategory::ReaderAddress => {
            let templates = [
                format!("The reader will have noticed that *{term}* has quietly organized everything said about {concept} so far."),
                format!("Whether this account of {concept} convinces depends on a *{term}* the reader already brings to it."),
                format!("One is entitled to suspect, at this point, that {concept} names the reader's predicament as much as {philosopher}'s."),
            ];
            pick(mgr, templates)
        }
    }
}

/// Render a metafictional concluding sentence from the essay's own usage.
pub fn conclusion(mgr: &mut CoherenceManager, concept: &str, term: &str) -> String {
    let templates = [
        format!("In attempting to conclude, we find ourselves caught in the very {concept} we sought to analyze, a testament to its pervasive influence."),
        format!("This essay, in its attempt to map {concept}, has perhaps only demonstrated the complexity and elusiveness of *{term}*."),
        format!("If there is a conclusion to be drawn from this examination of *{term}*, it is that {concept} continues to resist theoretical closure."),
        format!("What emerges is not a definitive account of {concept}, but a recognition of its irreducible entanglement with *{term}*."),
        format!("To conclude, if such a gesture is possible, is to acknowledge that any engagement with {concept} participates in the very *{term}* it seeks to elucidate."),
    ];
    pick(mgr, templates)
}

/// Indicators that a paragraph already reads as self-referential, in which
/// case splicing another metafictional unit would be redundant.
const SELF_REFERENCE_INDICATORS: [&str; 10] = [
    "this essay",
    "this text",
    "this paper",
    "this analysis",
    "this paragraph",
    "the author",
    "the reader",
    "complicity",
    "implicated",
    "self-reflexive",
];

pub fn is_self_referential(paragraph: &str) -> bool {
    let lower = paragraph.to_lowercase();
    SELF_REFERENCE_INDICATORS
        .iter()
        .any(|indicator| lower.contains(indicator))
}

fn pick<const N: usize>(mgr: &mut CoherenceManager, templates: [String; N]) -> String {
    let index = mgr.pick_index(N);
    templates.into_iter().nth(index).unwrap_or_default()
}
