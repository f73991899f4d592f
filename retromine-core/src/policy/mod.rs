//! Merging mined templates into an expansion policy's proposals.
//!
//! An expansion policy proposes [`ActionCandidate`]s for a set of query
//! molecules. Mined templates change those proposals in one of two ways:
//!
//! - **novel** templates are injected as new candidates ([`PolicyTemplateIntegrator::merge_additive`])
//! - **popular** and **overlooked** templates boost candidates the policy
//!   already proposes ([`PolicyTemplateIntegrator::merge_boost`])
//!
//! [`ExpansionPolicy`] wires loaded strategies to an optional optimisation.

pub mod expansion;
pub mod integration;

pub use expansion::{
    ExpansionPolicy, ExpansionStrategy, PolicyOptimisation, PrecomputedStrategy, StrategyConfig,
    StrategyRegistry,
};
pub use integration::PolicyTemplateIntegrator;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::types::RetroMineError;

/// One template application proposed by a policy.
///
/// `Clone` copies the metadata map, so a cloned candidate never shares
/// storage with its source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionCandidate {
    pub template: String,
    /// Probability mass assigned by the policy
    pub prior: f64,
    #[serde(default)]
    pub metadata: Map<String, Value>,
}

impl ActionCandidate {
    pub fn new(template: impl Into<String>, prior: f64) -> Self {
        Self {
            template: template.into(),
            prior,
            metadata: Map::new(),
        }
    }

    /// Metadata value as a string, when present and textual.
    #[must_use]
    pub fn metadata_str(&self, key: &str) -> Option<&str> {
        self.metadata.get(key).and_then(Value::as_str)
    }
}

/// How mined templates alter policy proposals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OptimisationKind {
    /// Inject unused templates missing from the library
    Novel,
    /// Boost templates the cheapest routes rely on
    Popular,
    /// Boost unused templates already in the library
    Overlooked,
}

impl OptimisationKind {
    /// Parses an optimisation name; `"none"` means no optimisation.
    ///
    /// # Errors
    ///
    /// Returns [`RetroMineError::Configuration`] for unknown names.
    pub fn from_name(name: &str) -> Result<Option<Self>, RetroMineError> {
        match name.trim().to_ascii_lowercase().as_str() {
            "none" | "" => Ok(None),
            other => other.parse().map(Some),
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Novel => "novel",
            Self::Popular => "popular",
            Self::Overlooked => "overlooked",
        }
    }

    /// Whether templates are injected rather than boosted.
    #[must_use]
    pub const fn is_additive(self) -> bool {
        matches!(self, Self::Novel)
    }
}

impl fmt::Display for OptimisationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OptimisationKind {
    type Err = RetroMineError;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        match name.trim().to_ascii_lowercase().as_str() {
            "novel" => Ok(Self::Novel),
            "popular" => Ok(Self::Popular),
            "overlooked" => Ok(Self::Overlooked),
            other => Err(RetroMineError::Configuration(format!(
                "unknown optimisation type '{other}' (expected novel, popular, overlooked or none)"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_optimisation_names() {
        assert_eq!(OptimisationKind::from_name("none").unwrap(), None);
        assert_eq!(
            OptimisationKind::from_name("Novel").unwrap(),
            Some(OptimisationKind::Novel)
        );
        assert!(OptimisationKind::Overlooked.to_string().parse::<OptimisationKind>().is_ok());
        assert!(!OptimisationKind::Popular.is_additive());
    }

    #[test]
    fn test_unknown_optimisation_is_configuration_error() {
        assert!(matches!(
            OptimisationKind::from_name("aggressive"),
            Err(RetroMineError::Configuration(_))
        ));
    }

    #[test]
    fn test_candidate_clone_is_deep() {
        let mut original = ActionCandidate::new("t", 0.5);
        original
            .metadata
            .insert("classification".to_string(), Value::from("base"));

        let mut copy = original.clone();
        copy.metadata
            .insert("classification".to_string(), Value::from("novel"));

        assert_eq!(original.metadata_str("classification"), Some("base"));
        assert_eq!(copy.metadata_str("classification"), Some("novel"));
    }

    #[test]
    fn test_candidate_metadata_defaults_to_empty() {
        let candidate: ActionCandidate =
            serde_json::from_str(r#"{"template": "t", "prior": 0.25}"#).unwrap();
        assert!(candidate.metadata.is_empty());
    }
}
