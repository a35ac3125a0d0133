//! Error types for resolution, pattern compilation and configuration validation

use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Failure reported by a credential store
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CredentialError {
    #[error("credential not found")]
    NotFound,

    #[error("lookup timed out after {0:?}")]
    Timeout(Duration),

    #[error("credential backend error: {0}")]
    Backend(String),
}

/// Errors raised while resolving `%name%` references
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ResolveError {
    #[error("unresolved reference '%{token}%' in {referrer}")]
    UnresolvedReference { token: String, referrer: String },

    #[error("cyclic reference: {}", .cycle.join(" -> "))]
    CyclicReference { cycle: Vec<String> },

    #[error("credential lookup failed for '{credential_id}' (referenced by {referrer}): {source}")]
    CredentialLookup {
        credential_id: String,
        referrer: String,
        #[source]
        source: CredentialError,
    },

    #[error("environment binding '{name}' not found (referenced by {referrer})")]
    UnboundEnvironment { name: String, referrer: String },
}

/// A glob pattern that cannot be compiled
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("invalid glob pattern '{pattern}': {reason}")]
pub struct InvalidGlobPattern {
    pub pattern: String,
    pub reason: String,
}

/// Kind of entity carrying an identity inside a project
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    VcsRoot,
    Pipeline,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityKind::VcsRoot => write!(f, "VCS root"),
            EntityKind::Pipeline => write!(f, "pipeline"),
        }
    }
}

/// A configuration defect found by validation
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("duplicate {entity} '{name}'")]
    DuplicateIdentity { entity: EntityKind, name: String },

    #[error("pipeline '{pipeline}' references missing VCS root '{root}'")]
    MissingVcsRoot { pipeline: String, root: String },

    #[error("invalid parameter name '{name}'")]
    InvalidParameterName { name: String },

    #[error("invalid requirement: {reason}")]
    InvalidRequirement { reason: String },

    #[error(transparent)]
    Resolve(#[from] ResolveError),

    #[error(transparent)]
    Pattern(#[from] InvalidGlobPattern),
}
