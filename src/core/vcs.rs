//! VCS root model

use crate::core::{branch_filter::BranchFilterRule, parameter::ParameterRef};

/// A source-control root shared by pipelines
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VcsRoot {
    /// Unique root name, used by pipelines to reference it
    pub name: String,

    /// Human-readable name
    pub display_name: String,

    /// Repository URL
    pub url: ParameterRef,

    /// Default branch
    pub branch: ParameterRef,

    /// Branches monitored besides the default one
    pub branch_spec: Vec<BranchFilterRule>,

    /// Authentication, if the repository needs it
    pub auth: Option<VcsAuth>,

    /// Whether the orchestrator may use a local mirror
    pub use_mirrors: bool,
}

/// Username/password authentication for a VCS root
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VcsAuth {
    pub username: ParameterRef,
    /// Usually a credential reference
    pub password: ParameterRef,
}

impl VcsRoot {
    pub fn new(name: impl Into<String>, url: ParameterRef, branch: ParameterRef) -> Self {
        let name = name.into();
        Self {
            display_name: name.clone(),
            name,
            url,
            branch,
            branch_spec: Vec::new(),
            auth: None,
            use_mirrors: false,
        }
    }

    pub fn with_branch_spec(mut self, rules: Vec<BranchFilterRule>) -> Self {
        self.branch_spec = rules;
        self
    }

    pub fn with_auth(mut self, username: ParameterRef, password: ParameterRef) -> Self {
        self.auth = Some(VcsAuth { username, password });
        self
    }
}
