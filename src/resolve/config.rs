//! Resolver configuration

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// How environment and credential references are finalized
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResolutionMode {
    /// Call the environment and credential lookups
    #[default]
    Live,
    /// Keep the substituted template as the value, without contacting any store
    Static,
}

/// Configuration for a [`Resolver`](crate::resolve::Resolver)
#[derive(Debug, Clone)]
pub struct ResolverConfig {
    /// Upper bound for one credential lookup
    pub credential_timeout: Duration,

    pub mode: ResolutionMode,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            credential_timeout: Duration::from_secs(30),
            mode: ResolutionMode::Live,
        }
    }
}

impl ResolverConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.credential_timeout = timeout;
        self
    }

    pub fn with_mode(mut self, mode: ResolutionMode) -> Self {
        self.mode = mode;
        self
    }
}
