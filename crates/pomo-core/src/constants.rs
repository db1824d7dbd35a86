/// Score multiplier for entities in the active theme's core set.
pub const THEME_CORE_MULTIPLIER: f64 = 3.0;

/// Score multiplier for entities merely associated with the active theme.
pub const THEME_ASSOCIATED_MULTIPLIER: f64 = 1.5;

/// Floor applied to an entity's weight when scoring a draw, so a heavily
/// decayed entity never drops out of the candidate set entirely.
pub const SCORE_FLOOR: f64 = 0.1;

/// Multiplicative weight decay applied to an entity each time it is used.
pub const DECAY_FACTOR: f64 = 0.8;

/// Multiplicative boost applied to graph neighbors and theme-core co-members
/// of a used entity. Keeps selection locally on-theme without renormalizing.
pub const RELATED_BOOST: f64 = 1.2;

/// Minimum number of paragraphs between two metafictional insertions.
pub const MIN_METAFICTION_SPACING: usize = 2;

/// How many most-recently-used metafiction categories are avoided when
/// picking the next one.
pub const RECENT_CATEGORY_WINDOW: usize = 3;

/// Recency window on the note-category stream used for endnote variety.
pub const NOTE_RECENCY_WINDOW: usize = 3;

/// Ceiling on the insertion probability after strategic-signal bonuses.
pub const MAX_INSERTION_PROBABILITY: f64 = 0.95;
