//! Knowledge-base provider for the pomo coherence engine.
//!
//! Loads a JSON knowledge file (or the bundled default dataset), converts it
//! into the engine's input snapshot, and validates it before any generation
//! begins. An empty required collection is a hard load error, never a silent
//! default.

pub mod convert;
pub mod error;
pub mod schema;

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use tracing::debug;

use pomo_core::{EntityId, KnowledgeSnapshot};

pub use error::{KbError, Result};

/// The dataset compiled into the binary, used when no file is supplied.
const DEFAULT_KB: &str = include_str!("../data/default_kb.json");

/// A loaded, validated knowledge base: the engine snapshot plus the surface
/// tables (key works, quotes) the essay layer consumes directly.
#[derive(Debug)]
pub struct KnowledgeBase {
    pub snapshot: KnowledgeSnapshot,
    /// Philosopher id -> (title, year) key works.
    pub key_works: BTreeMap<EntityId, Vec<(String, u32)>>,
    /// Philosopher id -> attributable quotes.
    pub quotes: BTreeMap<EntityId, Vec<String>>,
}

impl KnowledgeBase {
    /// Load and validate the bundled default dataset.
    pub fn bundled() -> Result<Self> {
        debug!("loading bundled knowledge base");
        Self::from_json(DEFAULT_KB)
    }

    /// Load and validate a JSON string.
    pub fn from_json(json: &str) -> Result<Self> {
        let file: schema::KbFile = serde_json::from_str(json)?;
        let converted = convert::convert(file);
        converted.snapshot.validate()?;
        Ok(Self {
            snapshot: converted.snapshot,
            key_works: converted.key_works,
            quotes: converted.quotes,
        })
    }

    /// Load and validate a JSON file from disk.
    pub fn from_file(path: &Path) -> Result<Self> {
        debug!(path = %path.display(), "loading knowledge base file");
        let json = fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Theme keys with their descriptions, in load order.
    pub fn theme_listing(&self) -> Vec<(&str, &str)> {
        self.snapshot
            .themes
            .iter()
            .map(|t| (t.key.as_str(), t.description.as_str()))
            .collect()
    }
}
