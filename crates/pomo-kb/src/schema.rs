//! Serde model of the JSON knowledge file.
//!
//! Every collection beyond the three entity lists defaults to empty so the
//! file can grow incrementally, and unknown keys are ignored for forward
//! compatibility with enriched data sources. Maps are `BTreeMap` so that
//! derived relations are built in a stable order regardless of file layout.

use std::collections::BTreeMap;

use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct KbFile {
    pub philosophers: Vec<String>,
    pub concepts: Vec<String>,
    pub terms: Vec<String>,
    #[serde(default)]
    pub thematic_clusters: BTreeMap<String, ThemeEntry>,
    #[serde(default)]
    pub philosopher_concepts: BTreeMap<String, Vec<String>>,
    #[serde(default)]
    pub philosopher_key_works: BTreeMap<String, Vec<(String, u32)>>,
    #[serde(default)]
    pub oppositional_pairs: Vec<(String, String)>,
    #[serde(default)]
    pub concept_relations: Vec<RelationEntry>,
    #[serde(default)]
    pub quotes: BTreeMap<String, Vec<String>>,
}

#[derive(Debug, Deserialize)]
pub struct ThemeEntry {
    pub description: String,
    #[serde(default)]
    pub core_philosophers: Vec<String>,
    #[serde(default)]
    pub key_concepts: Vec<String>,
    #[serde(default)]
    pub relevant_terms: Vec<String>,
    #[serde(default)]
    pub context_phrases: Vec<String>,
    #[serde(default)]
    pub related_adjectives: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct RelationEntry {
    pub a: String,
    pub b: String,
    pub kind: String,
    pub strength: f64,
    #[serde(default)]
    pub symmetric: bool,
}
