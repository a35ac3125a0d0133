//! External lookups used by the resolver: environment bindings and credential stores

use crate::core::error::CredentialError;
use async_trait::async_trait;
use std::collections::HashMap;
use std::fmt;

/// Opaque secret material returned by a credential store
///
/// `Debug` and `Display` never print the value; call [`SecretHandle::expose`]
/// to obtain it.
#[derive(Clone, PartialEq, Eq)]
pub struct SecretHandle {
    value: String,
}

impl SecretHandle {
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
        }
    }

    pub fn expose(&self) -> &str {
        &self.value
    }
}

impl fmt::Debug for SecretHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SecretHandle(***)")
    }
}

impl fmt::Display for SecretHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "***")
    }
}

/// Lookup of environment-style bindings by name
pub trait EnvironmentLookup: Send + Sync {
    fn lookup(&self, name: &str) -> Option<String>;
}

/// Reads bindings from the process environment
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnvironment;

impl EnvironmentLookup for ProcessEnvironment {
    fn lookup(&self, name: &str) -> Option<String> {
        std::env::var(name).ok()
    }
}

/// Bindings held in memory
#[derive(Debug, Clone, Default)]
pub struct MapEnvironment {
    vars: HashMap<String, String>,
}

impl MapEnvironment {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.vars.insert(name.into(), value.into());
        self
    }
}

impl EnvironmentLookup for MapEnvironment {
    fn lookup(&self, name: &str) -> Option<String> {
        self.vars.get(name).cloned()
    }
}

/// Source of secret material addressed by credential id
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Fetch the secret for `credential_id`
    async fn fetch(&self, credential_id: &str) -> Result<SecretHandle, CredentialError>;

    /// Store name for logging
    fn name(&self) -> &str;
}

/// Credential store backed by an in-memory map
#[derive(Clone, Default)]
pub struct InMemoryCredentialStore {
    secrets: HashMap<String, SecretHandle>,
}

impl InMemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, credential_id: impl Into<String>, secret: impl Into<String>) -> Self {
        self.secrets
            .insert(credential_id.into(), SecretHandle::new(secret));
        self
    }
}

#[async_trait]
impl CredentialStore for InMemoryCredentialStore {
    async fn fetch(&self, credential_id: &str) -> Result<SecretHandle, CredentialError> {
        self.secrets
            .get(credential_id)
            .cloned()
            .ok_or(CredentialError::NotFound)
    }

    fn name(&self) -> &str {
        "in-memory"
    }
}

/// Credential store reading secrets from environment variables
///
/// With a prefix, credential `GITHUB_TOKEN` is read from `<PREFIX>_GITHUB_TOKEN`.
#[derive(Debug, Clone, Default)]
pub struct EnvCredentialStore {
    prefix: Option<String>,
}

impl EnvCredentialStore {
    pub fn new(prefix: Option<String>) -> Self {
        Self { prefix }
    }

    fn variable_name(&self, credential_id: &str) -> String {
        match &self.prefix {
            Some(prefix) => format!("{}_{}", prefix, credential_id),
            None => credential_id.to_string(),
        }
    }
}

#[async_trait]
impl CredentialStore for EnvCredentialStore {
    async fn fetch(&self, credential_id: &str) -> Result<SecretHandle, CredentialError> {
        std::env::var(self.variable_name(credential_id))
            .map(SecretHandle::new)
            .map_err(|_| CredentialError::NotFound)
    }

    fn name(&self) -> &str {
        "environment"
    }
}
