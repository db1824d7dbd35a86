//! Optional `pomo.toml` configuration file.
//!
//! Command-line flags always win over the file; the file wins over built-in
//! defaults.

use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    pub seed: Option<u64>,
    pub theme: Option<String>,
    /// subtle | moderate | highly_self_aware
    pub metafiction: Option<String>,
    pub sections: Option<usize>,
}

impl FileConfig {
    /// Load from an explicit path (must exist), or from `pomo.toml` in the
    /// working directory if present, else defaults.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let path = match explicit {
            Some(path) => path.to_path_buf(),
            None => {
                let default = Path::new("pomo.toml");
                if !default.exists() {
                    return Ok(Self::default());
                }
                default.to_path_buf()
            }
        };
        let raw = std::fs::read_to_string(&path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        toml::from_str(&raw).with_context(|| format!("invalid config {}", path.display()))
    }
}
