//! Agent requirements and the matcher deciding agent eligibility

use crate::core::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Predicate applied to one agent attribute
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequirementKind {
    Contains,
    DoesNotContain,
}

/// A constraint on an agent attribute
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Requirement {
    pub kind: RequirementKind,
    pub key: String,
    #[serde(default)]
    pub value: String,
}

impl Requirement {
    pub fn contains(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            kind: RequirementKind::Contains,
            key: key.into(),
            value: value.into(),
        }
    }

    pub fn does_not_contain(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            kind: RequirementKind::DoesNotContain,
            key: key.into(),
            value: value.into(),
        }
    }

    /// Check the requirement is well formed
    pub fn check(&self) -> Result<(), ConfigError> {
        if self.key.trim().is_empty() {
            return Err(ConfigError::InvalidRequirement {
                reason: format!("{} requirement has an empty attribute key", self.kind_name()),
            });
        }
        Ok(())
    }

    /// Evaluate against one agent's attributes
    pub fn passes(&self, attributes: &BTreeMap<String, String>) -> bool {
        let actual = attributes.get(&self.key);
        match self.kind {
            RequirementKind::Contains => actual.is_some_and(|v| v.contains(&self.value)),
            RequirementKind::DoesNotContain => !actual.is_some_and(|v| v.contains(&self.value)),
        }
    }

    fn kind_name(&self) -> &'static str {
        match self.kind {
            RequirementKind::Contains => "contains",
            RequirementKind::DoesNotContain => "doesNotContain",
        }
    }
}

impl fmt::Display for Requirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({}, {:?})", self.kind_name(), self.key, self.value)
    }
}

/// Result of matching an agent against a requirement list
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RequirementOutcome {
    pub eligible: bool,
    /// Requirements the agent did not meet, in declared order
    pub failed: Vec<Requirement>,
}

/// Decide whether an agent satisfies every requirement
pub fn satisfies(attributes: &BTreeMap<String, String>, requirements: &[Requirement]) -> RequirementOutcome {
    let failed: Vec<Requirement> = requirements
        .iter()
        .filter(|r| !r.passes(attributes))
        .cloned()
        .collect();

    RequirementOutcome {
        eligible: failed.is_empty(),
        failed,
    }
}
