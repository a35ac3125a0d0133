//! Parameter resolution and the external lookups it depends on

pub mod config;
pub mod lookup;
pub mod resolver;

pub use config::{ResolutionMode, ResolverConfig};
pub use lookup::{
    CredentialStore, EnvCredentialStore, EnvironmentLookup, InMemoryCredentialStore, MapEnvironment,
    ProcessEnvironment, SecretHandle,
};
pub use resolver::{ResolutionPass, Resolver};
