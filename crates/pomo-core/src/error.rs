use std::fmt;

use crate::entity::{EntityCategory, EntityId};

/// Error taxonomy for the coherence engine.
///
/// `EmptyPool` and `MissingRelation` are recoverable: the engine resolves
/// them internally through documented fallbacks and they never escape the
/// facade during normal generation. `InvalidConfiguration` and
/// `StateCorruption` are fatal: the first aborts a run before any
/// generation begins, the second indicates a caller bug.
#[derive(Debug)]
pub enum CoherenceError {
    /// No eligible entity remained for a draw after exclusions.
    EmptyPool {
        category: EntityCategory,
        excluded: usize,
    },
    /// No graph relation or curated opposition exists for a concept.
    MissingRelation(EntityId),
    /// Malformed or empty knowledge-base snapshot.
    InvalidConfiguration(String),
    /// Snapshot/restore invariant violated.
    StateCorruption(String),
}

impl fmt::Display for CoherenceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CoherenceError::EmptyPool { category, excluded } => write!(
                f,
                "no eligible {} after excluding {excluded} entities",
                category.label()
            ),
            CoherenceError::MissingRelation(id) => {
                write!(f, "no relation or opposition recorded for concept '{id}'")
            }
            CoherenceError::InvalidConfiguration(msg) => {
                write!(f, "invalid knowledge base: {msg}")
            }
            CoherenceError::StateCorruption(msg) => write!(f, "state corruption: {msg}"),
        }
    }
}

impl std::error::Error for CoherenceError {}

pub type Result<T> = std::result::Result<T, CoherenceError>;
