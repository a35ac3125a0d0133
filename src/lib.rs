//! pipeconf - CI pipeline configuration: parameter resolution, validation,
//! trigger matching and agent selection

pub mod agent;
pub mod cli;
pub mod core;
pub mod engine;
pub mod resolve;
pub mod settings;

// Re-export commonly used types
pub use agent::{Agent, AgentInventory, AgentProvider};
pub use core::{ConfigError, ParameterRef, ParameterStore, Pipeline, Project, ResolveError};
pub use engine::{Catalog, CatalogError, ResolvedPipeline, ValidationReport, Validator};
pub use resolve::{CredentialStore, EnvironmentLookup, Resolver, ResolverConfig, SecretHandle};
pub use settings::EngineSettings;
