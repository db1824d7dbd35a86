use serde::{Deserialize, Serialize};

use crate::constants::{THEME_ASSOCIATED_MULTIPLIER, THEME_CORE_MULTIPLIER};
use crate::entity::EntityId;

/// A named thematic cluster supplied by the knowledge base.
///
/// Immutable once loaded. `core` members are heavily favored in draws,
/// `associated` members lightly favored; everything else scores neutrally.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Theme {
    pub key: String,
    pub description: String,
    /// Heavily favored entities, in load order.
    pub core: Vec<EntityId>,
    /// Lightly favored entities, in load order.
    pub associated: Vec<EntityId>,
    /// Surface phrases the sentence layer may weave in.
    pub context_phrases: Vec<String>,
    /// Adjectives characteristic of the theme's register.
    pub adjectives: Vec<String>,
}

impl Theme {
    pub fn is_core(&self, id: &EntityId) -> bool {
        self.core.iter().any(|m| m == id)
    }

    pub fn is_associated(&self, id: &EntityId) -> bool {
        self.associated.iter().any(|m| m == id)
    }

    /// Draw-score multiplier for an entity under this theme.
    pub fn multiplier(&self, id: &EntityId) -> f64 {
        if self.is_core(id) {
            THEME_CORE_MULTIPLIER
        } else if self.is_associated(id) {
            THEME_ASSOCIATED_MULTIPLIER
        } else {
            1.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn theme() -> Theme {
        Theme {
            key: "digital_subjectivity".to_string(),
            description: "Identity under computational mediation".to_string(),
            core: vec![EntityId::from_display("cyborg")],
            associated: vec![EntityId::from_display("hypertext")],
            context_phrases: vec![],
            adjectives: vec![],
        }
    }

    #[test]
    fn test_multiplier_tiers() {
        let t = theme();
        assert_eq!(t.multiplier(&EntityId::from_display("cyborg")), THEME_CORE_MULTIPLIER);
        assert_eq!(t.multiplier(&EntityId::from_display("hypertext")), THEME_ASSOCIATED_MULTIPLIER);
        assert_eq!(t.multiplier(&EntityId::from_display("aporia")), 1.0);
    }
}
