//! Project aggregate

use crate::core::{parameter::ParameterStore, pipeline::Pipeline, vcs::VcsRoot};

/// Root aggregate owning VCS roots and pipelines
///
/// Roots and pipelines are kept in declared order. Identities are expected to be
/// unique; duplicates are reported by validation rather than rejected here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Project {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    /// Base parameter scope shared by every pipeline
    pub params: ParameterStore,
    pub vcs_roots: Vec<VcsRoot>,
    pub pipelines: Vec<Pipeline>,
}

impl Project {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: None,
            params: ParameterStore::new(),
            vcs_roots: Vec::new(),
            pipelines: Vec::new(),
        }
    }

    pub fn with_params(mut self, params: ParameterStore) -> Self {
        self.params = params;
        self
    }

    pub fn with_vcs_root(mut self, root: VcsRoot) -> Self {
        self.vcs_roots.push(root);
        self
    }

    pub fn with_pipeline(mut self, pipeline: Pipeline) -> Self {
        self.pipelines.push(pipeline);
        self
    }

    /// Look up a VCS root by name
    pub fn vcs_root(&self, name: &str) -> Option<&VcsRoot> {
        self.vcs_roots.iter().find(|r| r.name == name)
    }

    /// Look up a pipeline by id
    pub fn pipeline(&self, id: &str) -> Option<&Pipeline> {
        self.pipelines.iter().find(|p| p.id == id)
    }

    /// Scope used to resolve a pipeline: predefined, then project, then pipeline parameters
    pub fn effective_scope(&self, pipeline: &Pipeline, predefined: &ParameterStore) -> ParameterStore {
        let base = ParameterStore::merge(predefined, &self.params);
        ParameterStore::merge(&base, &pipeline.params)
    }

    /// Scope used for entities outside any pipeline
    pub fn base_scope(&self, predefined: &ParameterStore) -> ParameterStore {
        ParameterStore::merge(predefined, &self.params)
    }
}
