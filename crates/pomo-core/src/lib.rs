//! Coherence and content-selection engine for long-form generated essays.
//!
//! Owns all selection state for one essay-generation run: weighted entity
//! sampling with usage decay and related-entity boost, a concept-relationship
//! graph driving thesis/antithesis/synthesis progression, and a strategic
//! placement decider for self-referential commentary.
//!
//! Zero I/O: pure selection logic with no opinions about sentence surface,
//! citation formatting, or where the knowledge base comes from. All randomness
//! routes through one seeded generator owned by the run, so a fixed seed and
//! knowledge base reproduce every draw bit for bit.

pub mod constants;
pub mod dialectic;
pub mod entity;
pub mod error;
pub mod graph;
pub mod input;
pub mod manager;
pub mod placement;
pub mod pool;
pub mod snapshot;
pub mod theme;
pub mod usage;

pub use constants::{
    DECAY_FACTOR, MIN_METAFICTION_SPACING, RECENT_CATEGORY_WINDOW, RELATED_BOOST, SCORE_FLOOR,
    THEME_ASSOCIATED_MULTIPLIER, THEME_CORE_MULTIPLIER,
};
pub use dialectic::{DialecticalProgressor, Stage};
pub use entity::{Entity, EntityCategory, EntityId};
pub use error::{CoherenceError, Result};
pub use graph::{ConceptGraph, ConceptRelation, RelationKind};
pub use input::{KnowledgeSnapshot, RelationSpec};
pub use manager::CoherenceManager;
pub use placement::{
    InsertionDecision, MetafictionCategory, MetafictionLevel, StrategicPlacementDecider,
};
pub use pool::EntityPool;
pub use snapshot::Snapshot;
pub use theme::Theme;
pub use usage::{UsageRecord, UsageRole, UsageSummary, UsageTracker};
