//! Fully-resolved pipeline handed to the orchestrator

use crate::core::{ArtifactRule, Requirement, Step};
use crate::resolve::SecretHandle;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

const MASK: &str = "***";

/// Checkout settings with every parameter substituted
#[derive(Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedCheckout {
    pub vcs_root: String,
    pub url: String,
    pub branch: String,
    pub branch_spec: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    pub clean_checkout: bool,
    pub use_mirrors: bool,
}

/// A pipeline with every placeholder replaced by its final value
///
/// Secret values appear in place; the handles fetched while resolving are kept
/// alongside (never serialized) so callers can mask them before output. `Debug`
/// output is masked the same way.
#[derive(Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedPipeline {
    pub id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub checkout: Option<ResolvedCheckout>,
    pub parameters: BTreeMap<String, String>,
    pub steps: Vec<Step>,
    pub artifact_rules: Vec<ArtifactRule>,
    pub branch_filter: Vec<String>,
    pub requirements: Vec<Requirement>,
    #[serde(skip)]
    pub(crate) secrets: Vec<SecretHandle>,
}

impl ResolvedPipeline {
    /// Secrets substituted into this pipeline
    pub fn secrets(&self) -> &[SecretHandle] {
        &self.secrets
    }

    /// Replace every secret value occurring in `text` with `***`
    pub fn mask(&self, text: &str) -> String {
        self.mask_forms(text, str::to_string)
    }

    /// Like [`mask`](Self::mask), for text where secrets appear `Debug`-escaped
    fn mask_debug(&self, text: &str) -> String {
        self.mask_forms(text, |secret| {
            let quoted = format!("{:?}", secret);
            quoted[1..quoted.len() - 1].to_string()
        })
    }

    fn masked<'a, T>(&'a self, value: &'a T) -> Masked<'a, T> {
        Masked { pipeline: self, value }
    }

    fn mask_forms(&self, text: &str, form: impl Fn(&str) -> String) -> String {
        let mut values: Vec<String> = self
            .secrets
            .iter()
            .map(SecretHandle::expose)
            .filter(|v| !v.is_empty())
            .map(form)
            .collect();
        // longest first so a secret containing another is masked whole
        values.sort_by_key(|v| std::cmp::Reverse(v.len()));

        values
            .into_iter()
            .fold(text.to_string(), |acc, secret| acc.replace(&secret, MASK))
    }

    /// Pretty JSON with secret values masked
    pub fn to_masked_json(&self) -> serde_json::Result<String> {
        let mut value = serde_json::to_value(self)?;
        self.mask_value(&mut value);
        serde_json::to_string_pretty(&value)
    }

    fn mask_value(&self, value: &mut serde_json::Value) {
        match value {
            serde_json::Value::String(s) => *s = self.mask(s),
            serde_json::Value::Array(items) => items.iter_mut().for_each(|v| self.mask_value(v)),
            serde_json::Value::Object(map) => map.values_mut().for_each(|v| self.mask_value(v)),
            _ => {}
        }
    }
}

impl fmt::Debug for ResolvedCheckout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResolvedCheckout")
            .field("vcs_root", &self.vcs_root)
            .field("url", &self.url)
            .field("branch", &self.branch)
            .field("branch_spec", &self.branch_spec)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| MASK))
            .field("clean_checkout", &self.clean_checkout)
            .field("use_mirrors", &self.use_mirrors)
            .finish()
    }
}

/// Debug-formats a field of a pipeline with that pipeline's secrets masked
struct Masked<'a, T> {
    pipeline: &'a ResolvedPipeline,
    value: &'a T,
}

impl<T: fmt::Debug> fmt::Debug for Masked<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = if f.alternate() {
            format!("{:#?}", self.value)
        } else {
            format!("{:?}", self.value)
        };
        f.write_str(&self.pipeline.mask_debug(&text))
    }
}

impl fmt::Debug for ResolvedPipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResolvedPipeline")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("checkout", &self.masked(&self.checkout))
            .field("parameters", &self.masked(&self.parameters))
            .field("steps", &self.masked(&self.steps))
            .field("artifact_rules", &self.masked(&self.artifact_rules))
            .field("branch_filter", &self.masked(&self.branch_filter))
            .field("requirements", &self.masked(&self.requirements))
            .field("secrets", &self.secrets.len())
            .finish()
    }
}
