//! Core domain models for pipeline configuration
//!
//! This module defines parameters, VCS roots, pipelines and the project
//! aggregate, together with the branch filter and requirement matchers.

pub mod branch_filter;
pub mod config;
pub mod error;
pub mod parameter;
pub mod pipeline;
pub mod project;
pub mod requirement;
pub mod vcs;

pub use branch_filter::{BranchFilter, BranchFilterRule, FilterSign, GlobPattern};
pub use error::{ConfigError, CredentialError, EntityKind, InvalidGlobPattern, ResolveError};
pub use parameter::{ParameterKind, ParameterRef, ParameterStore};
pub use pipeline::{ArtifactRule, Pipeline, Step};
pub use project::Project;
pub use requirement::{Requirement, RequirementKind, RequirementOutcome};
pub use vcs::{VcsAuth, VcsRoot};
