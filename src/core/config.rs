//! Project configuration from YAML
//!
//! The loader only maps YAML onto the domain model. Semantic checks (missing roots,
//! unresolved references, malformed patterns) belong to the validator so that every
//! problem is reported together.

use crate::core::{
    branch_filter::parse_rules, ParameterRef, ParameterStore, Pipeline, Project, Requirement, Step,
    VcsRoot,
};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_yaml::Value;
use std::collections::BTreeMap;
use std::path::Path;

/// Top-level project configuration loaded from YAML
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectConfig {
    /// Project identifier
    pub id: String,

    /// Display name
    pub name: String,

    #[serde(default)]
    pub description: Option<String>,

    /// Base parameters shared by every pipeline
    #[serde(default)]
    params: BTreeMap<String, Value>,

    #[serde(default)]
    pub vcs_roots: Vec<VcsRootConfig>,

    #[serde(default)]
    pub pipelines: Vec<PipelineConfig>,
}

/// VCS root as defined in YAML
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VcsRootConfig {
    pub name: String,

    #[serde(default)]
    pub display_name: Option<String>,

    pub url: String,

    #[serde(default = "default_branch")]
    pub branch: String,

    /// Multi-line `+:`/`-:` rule block
    #[serde(default)]
    pub branch_spec: String,

    #[serde(default)]
    pub auth: Option<AuthConfig>,

    #[serde(default)]
    pub use_mirrors: bool,
}

fn default_branch() -> String {
    "refs/heads/main".to_string()
}

/// VCS credentials; the password is usually a credential reference
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    pub username: String,
    password: Value,
}

/// Pipeline as defined in YAML
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    pub id: String,

    pub name: String,

    /// Name of the VCS root to check out
    pub vcs_root: String,

    #[serde(default)]
    pub clean_checkout: bool,

    #[serde(default)]
    params: BTreeMap<String, Value>,

    #[serde(default)]
    pub steps: Vec<StepConfig>,

    /// `source => target` rules
    #[serde(default)]
    pub artifact_rules: Vec<String>,

    #[serde(default)]
    pub triggers: Option<TriggerConfig>,

    #[serde(default)]
    pub requirements: Vec<Requirement>,
}

/// Step as defined in YAML
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepConfig {
    pub name: String,

    /// Runner type, e.g. `gradle` or `script`
    pub runner: String,

    #[serde(default)]
    pub args: Vec<String>,

    /// Scalar options; numbers and booleans are kept as their text form
    #[serde(default)]
    options: BTreeMap<String, Value>,
}

/// VCS trigger configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TriggerConfig {
    /// Multi-line `+:`/`-:` rule block
    #[serde(default)]
    pub branch_filter: String,
}

impl ProjectConfig {
    /// Load project configuration from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read project file: {}", path.display()))?;
        Self::from_yaml(&content)
    }

    /// Parse project configuration from a YAML string
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: ProjectConfig =
            serde_yaml::from_str(yaml).context("Failed to parse project YAML")?;
        Ok(config)
    }

    /// Convert to the project domain model
    pub fn to_project(&self) -> Result<Project> {
        let mut project = Project::new(&self.id, &self.name)
            .with_params(parameters(&self.params).context("Invalid project parameters")?);
        project.description = self.description.clone();

        for root in &self.vcs_roots {
            let root = root
                .to_vcs_root()
                .with_context(|| format!("Invalid VCS root '{}'", root.name))?;
            project = project.with_vcs_root(root);
        }

        for pipeline in &self.pipelines {
            let pipeline = pipeline
                .to_pipeline()
                .with_context(|| format!("Invalid pipeline '{}'", pipeline.id))?;
            project = project.with_pipeline(pipeline);
        }

        Ok(project)
    }
}

impl VcsRootConfig {
    fn to_vcs_root(&self) -> Result<VcsRoot> {
        let mut root = VcsRoot::new(
            &self.name,
            ParameterRef::parse(&self.url),
            ParameterRef::parse(&self.branch),
        )
        .with_branch_spec(parse_rules(&self.branch_spec));

        if let Some(display_name) = &self.display_name {
            root.display_name = display_name.clone();
        }
        if let Some(auth) = &self.auth {
            let password = parameter_ref("auth.password", &auth.password)?;
            root = root.with_auth(ParameterRef::parse(&auth.username), password);
        }
        root.use_mirrors = self.use_mirrors;

        Ok(root)
    }
}

impl PipelineConfig {
    fn to_pipeline(&self) -> Result<Pipeline> {
        let mut pipeline = Pipeline::new(&self.id, &self.name, &self.vcs_root)
            .with_params(parameters(&self.params)?);
        pipeline.clean_checkout = self.clean_checkout;

        for step in &self.steps {
            pipeline = pipeline.with_step(
                step.to_step()
                    .with_context(|| format!("Invalid step '{}'", step.name))?,
            );
        }
        for rule in &self.artifact_rules {
            pipeline = pipeline.with_artifact_rule(rule);
        }
        if let Some(triggers) = &self.triggers {
            pipeline = pipeline.with_branch_filter(parse_rules(&triggers.branch_filter));
        }
        for requirement in &self.requirements {
            pipeline = pipeline.with_requirement(requirement.clone());
        }

        Ok(pipeline)
    }
}

impl StepConfig {
    fn to_step(&self) -> Result<Step> {
        let mut step = Step::new(&self.name, &self.runner);
        step.args = self.args.clone();
        for (key, value) in &self.options {
            let value = scalar(value)
                .with_context(|| format!("Option '{}' must be a scalar", key))?;
            step = step.with_option(key, value);
        }
        Ok(step)
    }
}

fn parameters(params: &BTreeMap<String, Value>) -> Result<ParameterStore> {
    params
        .iter()
        .map(|(name, value)| parameter_ref(name, value).map(|value| (name.clone(), value)))
        .collect()
}

/// Parse one parameter value
///
/// Strings may carry the `credentialsJSON:` prefix; mappings name the kind explicitly
/// as `{ env: NAME }` or `{ credential: ID }`.
fn parameter_ref(name: &str, value: &Value) -> Result<ParameterRef> {
    match value {
        Value::String(s) => Ok(ParameterRef::parse(s)),
        Value::Mapping(map) => {
            let field = |key: &str| map.get(&Value::String(key.to_string())).and_then(Value::as_str);
            match (field("env"), field("credential"), map.len()) {
                (Some(env), None, 1) => Ok(ParameterRef::env(env)),
                (None, Some(credential), 1) => Ok(ParameterRef::credential(credential)),
                _ => anyhow::bail!(
                    "Parameter '{}' must have exactly one of 'env' or 'credential'",
                    name
                ),
            }
        }
        other => scalar(other)
            .map(ParameterRef::literal)
            .with_context(|| format!("Parameter '{}' has an unsupported value", name)),
    }
}

fn scalar(value: &Value) -> Result<String> {
    match value {
        Value::String(s) => Ok(s.clone()),
        Value::Number(n) => Ok(n.to_string()),
        Value::Bool(b) => Ok(b.to_string()),
        // `key:` with nothing after it
        Value::Null => Ok(String::new()),
        _ => anyhow::bail!("expected a string, number, boolean or nothing"),
    }
}

/// Load a YAML project file straight into the domain model
pub fn load_project<P: AsRef<Path>>(path: P) -> Result<Project> {
    ProjectConfig::from_file(path)?.to_project()
}
