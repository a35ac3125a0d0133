//! Pipeline domain model

use crate::core::{
    branch_filter::BranchFilterRule,
    parameter::ParameterStore,
    requirement::Requirement,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A build pipeline definition
///
/// String fields are templates: they may contain `%name%` tokens that are only
/// substituted when the pipeline is resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pipeline {
    /// Unique pipeline identifier
    pub id: String,

    /// Human-readable name
    pub name: String,

    /// Name of the VCS root this pipeline checks out (weak reference)
    pub vcs_root: String,

    /// Whether the orchestrator should wipe the checkout directory first
    pub clean_checkout: bool,

    /// Pipeline-local parameters, shadowing project parameters by name
    pub params: ParameterStore,

    /// Ordered build steps
    pub steps: Vec<Step>,

    /// Ordered artifact rules (`source => target`)
    pub artifact_rules: Vec<String>,

    /// VCS trigger branch filter; empty means the pipeline has no VCS trigger
    pub branch_filter: Vec<BranchFilterRule>,

    /// Agent requirements
    pub requirements: Vec<Requirement>,
}

impl Pipeline {
    pub fn new(id: impl Into<String>, name: impl Into<String>, vcs_root: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            vcs_root: vcs_root.into(),
            clean_checkout: false,
            params: ParameterStore::new(),
            steps: Vec::new(),
            artifact_rules: Vec::new(),
            branch_filter: Vec::new(),
            requirements: Vec::new(),
        }
    }

    pub fn with_params(mut self, params: ParameterStore) -> Self {
        self.params = params;
        self
    }

    pub fn with_step(mut self, step: Step) -> Self {
        self.steps.push(step);
        self
    }

    pub fn with_artifact_rule(mut self, rule: impl Into<String>) -> Self {
        self.artifact_rules.push(rule.into());
        self
    }

    pub fn with_branch_filter(mut self, rules: Vec<BranchFilterRule>) -> Self {
        self.branch_filter = rules;
        self
    }

    pub fn with_requirement(mut self, requirement: Requirement) -> Self {
        self.requirements.push(requirement);
        self
    }

    pub fn has_vcs_trigger(&self) -> bool {
        !self.branch_filter.is_empty()
    }
}

/// An opaque build step handed to the orchestrator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Step {
    /// Step name
    pub name: String,

    /// Runner type understood by the orchestrator (e.g. `gradle`, `script`)
    pub runner: String,

    /// Ordered arguments
    #[serde(default)]
    pub args: Vec<String>,

    /// Scalar options
    #[serde(default)]
    pub options: BTreeMap<String, String>,
}

impl Step {
    pub fn new(name: impl Into<String>, runner: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            runner: runner.into(),
            args: Vec::new(),
            options: BTreeMap::new(),
        }
    }

    pub fn with_arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn with_option(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.options.insert(key.into(), value.into());
        self
    }
}

/// An artifact publishing rule
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactRule {
    pub source: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
}

impl ArtifactRule {
    /// Split `source => target`; a rule without `=>` has no target
    pub fn parse(rule: &str) -> Self {
        match rule.split_once("=>") {
            Some((source, target)) => Self {
                source: source.trim().to_string(),
                target: Some(target.trim().to_string()).filter(|t| !t.is_empty()),
            },
            None => Self {
                source: rule.trim().to_string(),
                target: None,
            },
        }
    }
}
