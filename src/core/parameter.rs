//! Parameter references and scoped parameter stores
//!
//! A parameter value is a template that may embed `%name%` references to other
//! parameters. Stores are immutable once built; scoping is expressed by merging
//! a base store with an override store rather than by ambient lookup.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::OnceLock;

/// Prefix marking a raw value as a credential reference
pub const CREDENTIAL_PREFIX: &str = "credentialsJSON:";

/// How the substituted template of a parameter turns into its final value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParameterKind {
    /// The substituted template is the value
    Literal,
    /// The substituted template names an environment binding
    EnvRef,
    /// The substituted template is a credential id
    CredentialRef,
}

/// A raw parameter value, possibly containing `%name%` tokens
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ParameterRef {
    kind: ParameterKind,
    template: String,
}

/// A piece of a tokenized template
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Segment<'a> {
    /// Text copied as-is
    Text(&'a str),
    /// A reference to another parameter
    Token(&'a str),
}

fn token_regex() -> &'static Regex {
    static TOKEN: OnceLock<Regex> = OnceLock::new();
    TOKEN.get_or_init(|| {
        Regex::new(r"%\{([A-Za-z0-9_.]+)\}%|%([A-Za-z0-9_.]+)%").expect("token regex is valid")
    })
}

/// Check that a parameter name is usable inside a `%name%` token
pub fn is_valid_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '.' || c == '_')
}

impl ParameterRef {
    pub fn new(kind: ParameterKind, template: impl Into<String>) -> Self {
        Self {
            kind,
            template: template.into(),
        }
    }

    pub fn literal(template: impl Into<String>) -> Self {
        Self::new(ParameterKind::Literal, template)
    }

    pub fn env(template: impl Into<String>) -> Self {
        Self::new(ParameterKind::EnvRef, template)
    }

    pub fn credential(template: impl Into<String>) -> Self {
        Self::new(ParameterKind::CredentialRef, template)
    }

    /// Parse a raw string, recognizing the `credentialsJSON:` prefix
    pub fn parse(raw: &str) -> Self {
        match raw.strip_prefix(CREDENTIAL_PREFIX) {
            Some(rest) => Self::credential(rest),
            None => Self::literal(raw),
        }
    }

    pub fn kind(&self) -> ParameterKind {
        self.kind
    }

    pub fn template(&self) -> &str {
        &self.template
    }

    /// Split the template into text and tokens
    ///
    /// Any `%` that is not part of a well-formed token, including `%%`, stays text.
    pub fn segments(&self) -> Vec<Segment<'_>> {
        let mut segments = Vec::new();
        let mut last = 0;

        for caps in token_regex().captures_iter(&self.template) {
            let (Some(whole), Some(name)) = (caps.get(0), caps.get(1).or_else(|| caps.get(2))) else {
                continue;
            };
            if whole.start() > last {
                segments.push(Segment::Text(&self.template[last..whole.start()]));
            }
            segments.push(Segment::Token(name.as_str()));
            last = whole.end();
        }

        if last < self.template.len() {
            segments.push(Segment::Text(&self.template[last..]));
        }

        segments
    }

    /// Names referenced by the template, in order of appearance
    pub fn tokens(&self) -> Vec<&str> {
        self.segments()
            .into_iter()
            .filter_map(|s| match s {
                Segment::Token(name) => Some(name),
                _ => None,
            })
            .collect()
    }

    pub fn has_tokens(&self) -> bool {
        !self.tokens().is_empty()
    }
}

impl fmt::Display for ParameterRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            ParameterKind::Literal => write!(f, "{}", self.template),
            ParameterKind::EnvRef => write!(f, "env({})", self.template),
            ParameterKind::CredentialRef => write!(f, "{}{}", CREDENTIAL_PREFIX, self.template),
        }
    }
}

/// Immutable mapping of parameter name to raw value
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParameterStore {
    params: BTreeMap<String, ParameterRef>,
}

impl ParameterStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return a store with `name` set, replacing any earlier definition
    pub fn with(mut self, name: impl Into<String>, value: ParameterRef) -> Self {
        self.params.insert(name.into(), value);
        self
    }

    pub fn get(&self, name: &str) -> Option<&ParameterRef> {
        self.params.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.params.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.params.len()
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    /// Iterate parameters in name order
    pub fn iter(&self) -> impl Iterator<Item = (&String, &ParameterRef)> {
        self.params.iter()
    }

    /// Build a new store where `overrides` shadows `base` by name
    pub fn merge(base: &ParameterStore, overrides: &ParameterStore) -> ParameterStore {
        let mut params = base.params.clone();
        params.extend(
            overrides
                .params
                .iter()
                .map(|(k, v)| (k.clone(), v.clone())),
        );
        ParameterStore { params }
    }
}

impl FromIterator<(String, ParameterRef)> for ParameterStore {
    fn from_iter<I: IntoIterator<Item = (String, ParameterRef)>>(iter: I) -> Self {
        Self {
            params: iter.into_iter().collect(),
        }
    }
}
