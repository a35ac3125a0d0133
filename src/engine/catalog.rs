//! Installed projects and the queries an orchestrator runs against them

use crate::agent::Agent;
use crate::core::requirement::satisfies;
use crate::core::{BranchFilter, ParameterStore, Project, Requirement, RequirementOutcome};
use crate::engine::assembler::Assembler;
use crate::engine::resolved::ResolvedPipeline;
use crate::engine::validator::{ValidationIssue, ValidationReport, Validator};
use crate::resolve::Resolver;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Errors returned by catalog operations
#[derive(Debug, Clone, Error)]
pub enum CatalogError {
    #[error("{0}")]
    Invalid(ValidationReport),

    #[error("Unknown project: {0}")]
    UnknownProject(String),

    #[error("Unknown pipeline: {0}")]
    UnknownPipeline(String),

    #[error("Pipeline '{pipeline}' is already installed by project '{owner}'")]
    Conflict { pipeline: String, owner: String },

    #[error("Failed to resolve pipeline '{pipeline}': {}", summarize(.issues))]
    Resolution {
        pipeline: String,
        issues: Vec<ValidationIssue>,
    },
}

fn summarize(issues: &[ValidationIssue]) -> String {
    issues
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Per-agent matcher verdict, for diagnostics
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AgentEvaluation {
    pub agent_id: String,
    #[serde(flatten)]
    pub outcome: RequirementOutcome,
}

#[derive(Debug)]
struct CompiledPipeline {
    id: String,
    trigger: BranchFilter,
    requirements: Vec<Requirement>,
}

#[derive(Debug)]
struct InstalledProject {
    project: Project,
    pipelines: Vec<CompiledPipeline>,
}

impl InstalledProject {
    fn compiled(&self, pipeline_id: &str) -> Option<&CompiledPipeline> {
        self.pipelines.iter().find(|p| p.id == pipeline_id)
    }
}

/// Validated projects, keyed by id, with their trigger rules and requirements compiled
///
/// Installed projects are immutable and shared, so a catalog can be cloned cheaply and
/// queried from many tasks at once. Reinstalling a project replaces it wholesale.
#[derive(Debug, Clone)]
pub struct Catalog {
    resolver: Resolver,
    predefined: ParameterStore,
    projects: BTreeMap<String, Arc<InstalledProject>>,
    /// pipeline id -> owning project id
    pipeline_index: HashMap<String, String>,
}

impl Catalog {
    pub fn new(resolver: Resolver) -> Self {
        Self {
            resolver,
            predefined: ParameterStore::new(),
            projects: BTreeMap::new(),
            pipeline_index: HashMap::new(),
        }
    }

    /// Parameters supplied by the orchestrator, below every project scope
    pub fn with_predefined(mut self, predefined: ParameterStore) -> Self {
        self.predefined = predefined;
        self
    }

    /// Validate `project` and install it, replacing any project with the same id
    pub async fn install(&mut self, project: Project) -> Result<(), CatalogError> {
        let report = Validator::default()
            .with_predefined(self.predefined.clone())
            .validate(&project)
            .await;
        if !report.is_valid() {
            warn!("Rejected project '{}': {} issue(s)", project.id, report.len());
            return Err(CatalogError::Invalid(report));
        }

        for pipeline in &project.pipelines {
            if let Some(owner) = self.pipeline_index.get(&pipeline.id) {
                if owner != &project.id {
                    return Err(CatalogError::Conflict {
                        pipeline: pipeline.id.clone(),
                        owner: owner.clone(),
                    });
                }
            }
        }

        let mut pipelines = Vec::with_capacity(project.pipelines.len());
        for pipeline in &project.pipelines {
            let scope = project.effective_scope(pipeline, &self.predefined);
            let mut assembler = Assembler::new(&self.resolver, &scope);
            let (trigger, requirements) = assembler.matchers(pipeline).await;
            let (issues, _) = assembler.finish();
            if !issues.is_empty() {
                return Err(CatalogError::Resolution {
                    pipeline: pipeline.id.clone(),
                    issues,
                });
            }

            debug!(
                "Compiled pipeline '{}': {} trigger rule(s), {} requirement(s)",
                pipeline.id,
                trigger.rules().len(),
                requirements.len()
            );
            pipelines.push(CompiledPipeline {
                id: pipeline.id.clone(),
                trigger,
                requirements,
            });
        }

        self.pipeline_index.retain(|_, owner| owner != &project.id);
        for pipeline in &project.pipelines {
            self.pipeline_index
                .insert(pipeline.id.clone(), project.id.clone());
        }

        info!(
            "Installed project '{}' with {} pipeline(s)",
            project.id,
            pipelines.len()
        );
        self.projects.insert(
            project.id.clone(),
            Arc::new(InstalledProject { project, pipelines }),
        );
        Ok(())
    }

    pub fn project(&self, project_id: &str) -> Option<&Project> {
        self.projects.get(project_id).map(|p| &p.project)
    }

    /// Installed project ids in ascending order
    pub fn project_ids(&self) -> impl Iterator<Item = &str> {
        self.projects.keys().map(String::as_str)
    }

    fn compiled(&self, pipeline_id: &str) -> Result<&CompiledPipeline, CatalogError> {
        self.pipeline_index
            .get(pipeline_id)
            .and_then(|project_id| self.projects.get(project_id))
            .and_then(|installed| installed.compiled(pipeline_id))
            .ok_or_else(|| CatalogError::UnknownPipeline(pipeline_id.to_string()))
    }

    /// Fully resolve a pipeline against live environment and credential lookups
    pub async fn resolve_pipeline(
        &self,
        project_id: &str,
        pipeline_id: &str,
    ) -> Result<ResolvedPipeline, CatalogError> {
        let installed = self
            .projects
            .get(project_id)
            .ok_or_else(|| CatalogError::UnknownProject(project_id.to_string()))?;
        let project = &installed.project;
        let pipeline = project
            .pipeline(pipeline_id)
            .ok_or_else(|| CatalogError::UnknownPipeline(pipeline_id.to_string()))?;

        let scope = project.effective_scope(pipeline, &self.predefined);
        let mut assembler = Assembler::new(&self.resolver, &scope);
        let (mut resolved, _) = assembler
            .pipeline(pipeline, project.vcs_root(&pipeline.vcs_root))
            .await;
        let (issues, secrets) = assembler.finish();

        if !issues.is_empty() {
            warn!(
                "Resolution of pipeline '{}' failed with {} issue(s)",
                pipeline_id,
                issues.len()
            );
            return Err(CatalogError::Resolution {
                pipeline: pipeline_id.to_string(),
                issues,
            });
        }

        debug!(
            "Resolved pipeline '{}' ({} secret(s) substituted)",
            pipeline_id,
            secrets.len()
        );
        resolved.secrets = secrets;
        Ok(resolved)
    }

    /// Whether a change on `ref_name` should trigger `pipeline_id`
    ///
    /// A pipeline without trigger rules is never triggered by VCS changes.
    pub fn is_trigger_applicable(&self, pipeline_id: &str, ref_name: &str) -> Result<bool, CatalogError> {
        let compiled = self.compiled(pipeline_id)?;
        Ok(compiled.trigger.matches(ref_name))
    }

    /// Every installed pipeline a change on `ref_name` triggers
    pub fn triggered_pipelines(&self, ref_name: &str) -> Vec<String> {
        self.projects
            .values()
            .flat_map(|installed| installed.pipelines.iter())
            .filter(|compiled| compiled.trigger.matches(ref_name))
            .map(|compiled| compiled.id.clone())
            .collect()
    }

    /// Ids of the agents satisfying every requirement of `pipeline_id`, in input order
    pub fn select_eligible_agents(&self, pipeline_id: &str, agents: &[Agent]) -> Result<Vec<String>, CatalogError> {
        Ok(self
            .explain_agents(pipeline_id, agents)?
            .into_iter()
            .filter(|evaluation| evaluation.outcome.eligible)
            .map(|evaluation| evaluation.agent_id)
            .collect())
    }

    /// Matcher verdict for every agent, including the requirements it failed
    pub fn explain_agents(&self, pipeline_id: &str, agents: &[Agent]) -> Result<Vec<AgentEvaluation>, CatalogError> {
        let compiled = self.compiled(pipeline_id)?;
        Ok(agents
            .iter()
            .map(|agent| AgentEvaluation {
                agent_id: agent.id.clone(),
                outcome: satisfies(&agent.attributes, &compiled.requirements),
            })
            .collect())
    }
}
