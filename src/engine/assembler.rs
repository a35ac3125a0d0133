//! Walks a pipeline definition and resolves every field, collecting failures
//!
//! Shared by validation (static resolver, issues are the product) and by the
//! catalog (live resolver, the resolved pipeline is the product).

use crate::core::{
    ArtifactRule, BranchFilter, BranchFilterRule, ConfigError, ParameterRef, ParameterStore, Pipeline,
    Requirement, ResolveError, Step, VcsRoot,
};
use crate::engine::resolved::{ResolvedCheckout, ResolvedPipeline};
use crate::engine::validator::ValidationIssue;
use crate::resolve::{ResolutionPass, Resolver, SecretHandle};
use std::collections::BTreeMap;

pub(crate) struct Assembler<'a> {
    pass: ResolutionPass<'a>,
    issues: Vec<ValidationIssue>,
}

impl<'a> Assembler<'a> {
    pub fn new(resolver: &'a Resolver, scope: &'a ParameterStore) -> Self {
        Self {
            pass: resolver.pass(scope),
            issues: Vec::new(),
        }
    }

    fn issue(&mut self, location: impl Into<String>, error: impl Into<ConfigError>) {
        self.issues.push(ValidationIssue::new(location, error));
    }

    fn record(&mut self, result: Result<String, ResolveError>, location: String) -> String {
        result.unwrap_or_else(|e| {
            self.issue(location, e);
            String::new()
        })
    }

    async fn value(&mut self, value: &ParameterRef, location: String) -> String {
        let result = self.pass.resolve(value, &location).await;
        self.record(result, location)
    }

    /// Resolve a named parameter of the scope, sharing the pass memo with token lookups
    async fn param(&mut self, name: &str, location: String) -> String {
        let result = self.pass.resolve_param(name, &location).await;
        self.record(result, location)
    }

    async fn text(&mut self, template: &str, location: String) -> String {
        self.value(&ParameterRef::literal(template), location).await
    }

    /// Resolve and compile filter rules; malformed patterns are reported and skipped
    async fn branch_rules(&mut self, rules: &[BranchFilterRule], location: &str) -> (Vec<String>, BranchFilter) {
        let mut text = Vec::with_capacity(rules.len());
        let mut compiled = Vec::with_capacity(rules.len());

        for (i, rule) in rules.iter().enumerate() {
            let field = format!("{}[{}]", location, i);
            let resolved = BranchFilterRule {
                sign: rule.sign,
                pattern: self.text(&rule.pattern, field.clone()).await,
            };
            match resolved.compile() {
                Ok(rule) => compiled.push(rule),
                Err(e) => self.issue(field, e),
            }
            text.push(resolved.to_string());
        }

        (text, BranchFilter::new(compiled))
    }

    pub async fn checkout(&mut self, root: &VcsRoot, clean_checkout: bool, location: &str) -> ResolvedCheckout {
        let url = self.value(&root.url, format!("{}.url", location)).await;
        let branch = self.value(&root.branch, format!("{}.branch", location)).await;
        let (branch_spec, _) = self
            .branch_rules(&root.branch_spec, &format!("{}.branch_spec", location))
            .await;

        let (username, password) = match &root.auth {
            Some(auth) => {
                let username = self
                    .value(&auth.username, format!("{}.auth.username", location))
                    .await;
                let password = self
                    .value(&auth.password, format!("{}.auth.password", location))
                    .await;
                (Some(username), Some(password))
            }
            None => (None, None),
        };

        ResolvedCheckout {
            vcs_root: root.name.clone(),
            url,
            branch,
            branch_spec,
            username,
            password,
            clean_checkout,
            use_mirrors: root.use_mirrors,
        }
    }

    async fn step(&mut self, step: &Step, location: String) -> Step {
        let name = self.text(&step.name, format!("{}.name", location)).await;

        let mut args = Vec::with_capacity(step.args.len());
        for (i, arg) in step.args.iter().enumerate() {
            args.push(self.text(arg, format!("{}.args[{}]", location, i)).await);
        }

        let mut options = BTreeMap::new();
        for (key, value) in &step.options {
            let resolved = self.text(value, format!("{}.options.{}", location, key)).await;
            options.insert(key.clone(), resolved);
        }

        Step {
            name,
            runner: step.runner.clone(),
            args,
            options,
        }
    }

    async fn requirement(&mut self, requirement: &Requirement, location: String) -> Requirement {
        let resolved = Requirement {
            kind: requirement.kind,
            key: self.text(&requirement.key, format!("{}.key", location)).await,
            value: self.text(&requirement.value, format!("{}.value", location)).await,
        };
        if let Err(error) = resolved.check() {
            self.issue(location, error);
        }
        resolved
    }

    async fn requirements(&mut self, pipeline: &Pipeline) -> Vec<Requirement> {
        let mut requirements = Vec::with_capacity(pipeline.requirements.len());
        for (i, requirement) in pipeline.requirements.iter().enumerate() {
            requirements.push(
                self.requirement(requirement, format!("{}.requirements[{}]", pipeline.id, i))
                    .await,
            );
        }
        requirements
    }

    /// Resolve only the trigger rules and requirements of `pipeline`
    pub async fn matchers(&mut self, pipeline: &Pipeline) -> (BranchFilter, Vec<Requirement>) {
        let (_, trigger) = self
            .branch_rules(&pipeline.branch_filter, &format!("{}.branch_filter", pipeline.id))
            .await;
        let requirements = self.requirements(pipeline).await;
        (trigger, requirements)
    }

    /// Resolve every field of `pipeline`, returning the compiled trigger alongside
    pub async fn pipeline(&mut self, pipeline: &Pipeline, root: Option<&VcsRoot>) -> (ResolvedPipeline, BranchFilter) {
        let id = &pipeline.id;

        let checkout = match root {
            Some(root) => Some(
                self.checkout(root, pipeline.clean_checkout, &format!("{}.vcs", id))
                    .await,
            ),
            None => None,
        };

        let mut parameters = BTreeMap::new();
        for (name, _) in pipeline.params.iter() {
            let resolved = self.param(name, format!("{}.params.{}", id, name)).await;
            parameters.insert(name.clone(), resolved);
        }

        let mut steps = Vec::with_capacity(pipeline.steps.len());
        for (i, step) in pipeline.steps.iter().enumerate() {
            steps.push(self.step(step, format!("{}.steps[{}]", id, i)).await);
        }

        let mut artifact_rules = Vec::with_capacity(pipeline.artifact_rules.len());
        for (i, rule) in pipeline.artifact_rules.iter().enumerate() {
            let resolved = self.text(rule, format!("{}.artifact_rules[{}]", id, i)).await;
            artifact_rules.push(ArtifactRule::parse(&resolved));
        }

        let (branch_filter, trigger) = self
            .branch_rules(&pipeline.branch_filter, &format!("{}.branch_filter", id))
            .await;
        let requirements = self.requirements(pipeline).await;

        let resolved = ResolvedPipeline {
            id: id.clone(),
            name: self.text(&pipeline.name, format!("{}.name", id)).await,
            checkout,
            parameters,
            steps,
            artifact_rules,
            branch_filter,
            requirements,
            secrets: Vec::new(),
        };

        (resolved, trigger)
    }

    pub fn finish(self) -> (Vec<ValidationIssue>, Vec<SecretHandle>) {
        (self.issues, self.pass.into_secrets())
    }
}
