//! Project validation - reports every configuration defect in one pass

use crate::core::{ConfigError, EntityKind, ParameterStore, Project, parameter::is_valid_name};
use crate::engine::assembler::Assembler;
use crate::resolve::Resolver;
use std::collections::HashSet;
use std::fmt;
use tracing::{debug, info};

/// One defect, located by a dotted field path
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationIssue {
    pub location: String,
    pub error: ConfigError,
}

impl ValidationIssue {
    pub fn new(location: impl Into<String>, error: impl Into<ConfigError>) -> Self {
        Self {
            location: location.into(),
            error: error.into(),
        }
    }
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.location, self.error)
    }
}

/// All defects found in a project
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationReport {
    project: String,
    issues: Vec<ValidationIssue>,
}

impl ValidationReport {
    pub fn new(project: impl Into<String>) -> Self {
        Self {
            project: project.into(),
            issues: Vec::new(),
        }
    }

    pub fn project(&self) -> &str {
        &self.project
    }

    pub fn is_valid(&self) -> bool {
        self.issues.is_empty()
    }

    pub fn issues(&self) -> &[ValidationIssue] {
        &self.issues
    }

    pub fn len(&self) -> usize {
        self.issues.len()
    }

    pub fn is_empty(&self) -> bool {
        self.issues.is_empty()
    }

    pub fn push(&mut self, location: impl Into<String>, error: impl Into<ConfigError>) {
        self.issues.push(ValidationIssue::new(location, error));
    }

    pub fn extend(&mut self, issues: impl IntoIterator<Item = ValidationIssue>) {
        self.issues.extend(issues);
    }
}

impl fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_valid() {
            return write!(f, "project '{}' is valid", self.project);
        }
        write!(f, "project '{}' has {} issue(s):", self.project, self.issues.len())?;
        for issue in &self.issues {
            write!(f, "\n  - {}", issue)?;
        }
        Ok(())
    }
}

/// Validates projects by dry-running resolution of every field
///
/// The default validator uses a static resolver, so no environment or credential
/// store is contacted.
#[derive(Debug, Clone)]
pub struct Validator {
    resolver: Resolver,
    predefined: ParameterStore,
}

impl Default for Validator {
    fn default() -> Self {
        Self::new(Resolver::static_mode())
    }
}

impl Validator {
    pub fn new(resolver: Resolver) -> Self {
        Self {
            resolver,
            predefined: ParameterStore::new(),
        }
    }

    /// Parameters supplied by the orchestrator, below the project scope
    pub fn with_predefined(mut self, predefined: ParameterStore) -> Self {
        self.predefined = predefined;
        self
    }

    pub async fn validate(&self, project: &Project) -> ValidationReport {
        let mut report = ValidationReport::new(&project.id);

        check_identities(project, &mut report);
        check_parameter_names(project, &mut report);

        // roots no pipeline uses are still resolved, against the project scope
        let referenced: HashSet<&str> = project
            .pipelines
            .iter()
            .map(|p| p.vcs_root.as_str())
            .collect();
        let base = project.base_scope(&self.predefined);
        for root in project.vcs_roots.iter().filter(|r| !referenced.contains(r.name.as_str())) {
            let mut assembler = Assembler::new(&self.resolver, &base);
            assembler
                .checkout(root, false, &format!("vcs_roots.{}", root.name))
                .await;
            report.extend(assembler.finish().0);
        }

        for pipeline in &project.pipelines {
            let root = project.vcs_root(&pipeline.vcs_root);
            if root.is_none() {
                report.push(
                    format!("{}.vcs_root", pipeline.id),
                    ConfigError::MissingVcsRoot {
                        pipeline: pipeline.id.clone(),
                        root: pipeline.vcs_root.clone(),
                    },
                );
            }

            let scope = project.effective_scope(pipeline, &self.predefined);
            let mut assembler = Assembler::new(&self.resolver, &scope);
            assembler.pipeline(pipeline, root).await;
            let (issues, _) = assembler.finish();
            debug!("Pipeline '{}' checked: {} issue(s)", pipeline.id, issues.len());
            report.extend(issues);
        }

        info!(
            "Validated project '{}': {} issue(s)",
            project.id,
            report.len()
        );
        report
    }
}

/// Validate with a static resolver and no predefined parameters
pub async fn validate(project: &Project) -> ValidationReport {
    Validator::default().validate(project).await
}

fn check_identities(project: &Project, report: &mut ValidationReport) {
    let mut seen_roots = HashSet::new();
    for root in &project.vcs_roots {
        if !seen_roots.insert(root.name.as_str()) {
            report.push(
                "vcs_roots",
                ConfigError::DuplicateIdentity {
                    entity: EntityKind::VcsRoot,
                    name: root.name.clone(),
                },
            );
        }
    }

    let mut seen_pipelines = HashSet::new();
    for pipeline in &project.pipelines {
        if !seen_pipelines.insert(pipeline.id.as_str()) {
            report.push(
                "pipelines",
                ConfigError::DuplicateIdentity {
                    entity: EntityKind::Pipeline,
                    name: pipeline.id.clone(),
                },
            );
        }
    }
}

fn check_parameter_names(project: &Project, report: &mut ValidationReport) {
    let project_params = project.params.iter().map(|(name, _)| ("params".to_string(), name));
    let pipeline_params = project.pipelines.iter().flat_map(|p| {
        p.params
            .iter()
            .map(move |(name, _)| (format!("{}.params", p.id), name))
    });

    for (scope, name) in project_params.chain(pipeline_params) {
        if !is_valid_name(name) {
            report.push(
                format!("{}.{}", scope, name),
                ConfigError::InvalidParameterName { name: name.clone() },
            );
        }
    }
}
