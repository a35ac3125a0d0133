//! Reference resolver - substitutes `%name%` tokens across a parameter scope

use crate::core::error::{CredentialError, ResolveError};
use crate::core::parameter::{ParameterKind, ParameterRef, ParameterStore, Segment};
use crate::resolve::config::{ResolutionMode, ResolverConfig};
use crate::resolve::lookup::{
    CredentialStore, EnvironmentLookup, InMemoryCredentialStore, MapEnvironment, SecretHandle,
};
use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use tokio::time::timeout;
use tracing::{debug, warn};

type ResolveFuture<'s> = Pin<Box<dyn Future<Output = Result<String, ResolveError>> + Send + 's>>;

/// Resolves parameter references against a scope
///
/// The resolver itself is stateless and cheap to clone; per-scope state lives in a
/// [`ResolutionPass`].
#[derive(Clone)]
pub struct Resolver {
    environment: Arc<dyn EnvironmentLookup>,
    credentials: Arc<dyn CredentialStore>,
    config: ResolverConfig,
}

impl fmt::Debug for Resolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Resolver")
            .field("credentials", &self.credentials.name())
            .field("config", &self.config)
            .finish()
    }
}

impl Resolver {
    pub fn new(
        environment: Arc<dyn EnvironmentLookup>,
        credentials: Arc<dyn CredentialStore>,
        config: ResolverConfig,
    ) -> Self {
        Self {
            environment,
            credentials,
            config,
        }
    }

    /// A resolver that never contacts environment or credential lookups
    pub fn static_mode() -> Self {
        Self::new(
            Arc::new(MapEnvironment::new()),
            Arc::new(InMemoryCredentialStore::new()),
            ResolverConfig::new().with_mode(ResolutionMode::Static),
        )
    }

    pub fn mode(&self) -> ResolutionMode {
        self.config.mode
    }

    /// Start a resolution pass over `scope`
    pub fn pass<'a>(&'a self, scope: &'a ParameterStore) -> ResolutionPass<'a> {
        ResolutionPass {
            resolver: self,
            scope,
            resolved: HashMap::new(),
            secrets: Vec::new(),
        }
    }

    /// Resolve a single value; `referrer` names the entity holding it
    pub async fn resolve(
        &self,
        value: &ParameterRef,
        scope: &ParameterStore,
        referrer: &str,
    ) -> Result<String, ResolveError> {
        self.pass(scope).resolve(value, referrer).await
    }

    async fn fetch_credential(&self, credential_id: &str) -> Result<SecretHandle, CredentialError> {
        debug!(
            credential_id,
            store = self.credentials.name(),
            "Fetching credential"
        );

        match timeout(self.config.credential_timeout, self.credentials.fetch(credential_id)).await {
            Ok(Ok(secret)) => Ok(secret),
            Ok(Err(e)) => {
                warn!(credential_id, "Credential lookup failed: {}", e);
                Err(e)
            }
            Err(_) => {
                warn!(
                    credential_id,
                    "Credential lookup timed out after {:?}", self.config.credential_timeout
                );
                Err(CredentialError::Timeout(self.config.credential_timeout))
            }
        }
    }
}

/// State for resolving many values against one scope
///
/// Each parameter is resolved at most once per pass, so a credential is fetched
/// at most once no matter how many fields reference it.
pub struct ResolutionPass<'a> {
    resolver: &'a Resolver,
    scope: &'a ParameterStore,
    resolved: HashMap<String, String>,
    secrets: Vec<SecretHandle>,
}

impl<'a> ResolutionPass<'a> {
    /// Resolve a value held by `referrer`
    pub async fn resolve(&mut self, value: &ParameterRef, referrer: &str) -> Result<String, ResolveError> {
        let mut visiting = Vec::new();
        self.resolve_value(value, referrer, &mut visiting).await
    }

    /// Resolve a plain template string
    pub async fn resolve_text(&mut self, template: &str, referrer: &str) -> Result<String, ResolveError> {
        self.resolve(&ParameterRef::literal(template), referrer).await
    }

    /// Resolve the parameter called `name` in this pass's scope
    pub async fn resolve_param(&mut self, name: &str, referrer: &str) -> Result<String, ResolveError> {
        let token = format!("%{}%", name);
        self.resolve_text(&token, referrer).await
    }

    /// Secrets fetched so far
    pub fn secrets(&self) -> &[SecretHandle] {
        &self.secrets
    }

    pub fn into_secrets(self) -> Vec<SecretHandle> {
        self.secrets
    }

    fn resolve_value<'s>(
        &'s mut self,
        value: &'s ParameterRef,
        referrer: &'s str,
        visiting: &'s mut Vec<String>,
    ) -> ResolveFuture<'s> {
        Box::pin(async move {
            let mut output = String::with_capacity(value.template().len());

            for segment in value.segments() {
                match segment {
                    Segment::Text(text) => output.push_str(text),
                    Segment::Token(name) => {
                        if let Some(start) = visiting.iter().position(|n| n == name) {
                            let mut cycle = visiting[start..].to_vec();
                            cycle.push(name.to_string());
                            return Err(ResolveError::CyclicReference { cycle });
                        }

                        if let Some(done) = self.resolved.get(name) {
                            output.push_str(done);
                            continue;
                        }

                        let next = self
                            .scope
                            .get(name)
                            .cloned()
                            .ok_or_else(|| ResolveError::UnresolvedReference {
                                token: name.to_string(),
                                referrer: referrer.to_string(),
                            })?;

                        visiting.push(name.to_string());
                        let result = self.resolve_value(&next, name, visiting).await;
                        visiting.pop();

                        let resolved = result?;
                        output.push_str(&resolved);
                        self.resolved.insert(name.to_string(), resolved);
                    }
                }
            }

            self.finish(value.kind(), output, referrer).await
        })
    }

    async fn finish(&mut self, kind: ParameterKind, text: String, referrer: &str) -> Result<String, ResolveError> {
        if self.resolver.mode() == ResolutionMode::Static {
            return Ok(text);
        }

        match kind {
            ParameterKind::Literal => Ok(text),
            ParameterKind::EnvRef => self.resolver.environment.lookup(&text).ok_or_else(|| {
                ResolveError::UnboundEnvironment {
                    name: text,
                    referrer: referrer.to_string(),
                }
            }),
            ParameterKind::CredentialRef => {
                let secret = self
                    .resolver
                    .fetch_credential(&text)
                    .await
                    .map_err(|source| ResolveError::CredentialLookup {
                        credential_id: text.clone(),
                        referrer: referrer.to_string(),
                        source,
                    })?;
                let value = secret.expose().to_string();
                self.secrets.push(secret);
                Ok(value)
            }
        }
    }
}
