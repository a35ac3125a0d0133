//! Engine settings

use crate::core::{ParameterRef, ParameterStore};
use crate::resolve::ResolverConfig;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

/// Settings for the resolver and the orchestrator-supplied scope
///
/// ```yaml
/// credential_timeout_secs: 10
/// credential_env_prefix: PIPECONF_SECRET
/// predefined:
///   teamcity.build.checkoutDir: /work
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineSettings {
    /// Upper bound on a single credential lookup
    pub credential_timeout_secs: u64,

    /// Prefix for the environment-backed credential store (`PREFIX_<ID>`)
    pub credential_env_prefix: Option<String>,

    /// Predefined parameters, below project parameters in precedence
    pub predefined: BTreeMap<String, String>,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            credential_timeout_secs: 30,
            credential_env_prefix: None,
            predefined: BTreeMap::new(),
        }
    }
}

impl EngineSettings {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read settings: {}", path.display()))?;
        Self::from_yaml(&content)
    }

    pub fn from_yaml(yaml: &str) -> Result<Self> {
        serde_yaml::from_str(yaml).context("Failed to parse settings YAML")
    }

    /// Default location: `<config dir>/pipeconf/settings.yaml`
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("pipeconf").join("settings.yaml"))
    }

    /// Load from `path` if given, else from the default location if it exists,
    /// else fall back to defaults
    pub fn load(path: Option<&str>) -> Result<Self> {
        if let Some(path) = path {
            return Self::from_file(path);
        }

        match Self::default_path().filter(|p| p.exists()) {
            Some(path) => {
                debug!("Loading settings from {}", path.display());
                Self::from_file(path)
            }
            None => Ok(Self::default()),
        }
    }

    pub fn resolver_config(&self) -> ResolverConfig {
        ResolverConfig::new().with_timeout(Duration::from_secs(self.credential_timeout_secs))
    }

    /// Predefined parameters as a literal scope
    pub fn predefined_store(&self) -> ParameterStore {
        self.predefined
            .iter()
            .map(|(name, value)| (name.clone(), ParameterRef::literal(value)))
            .collect()
    }

    /// Predefined parameters overlaid with command-line `key=value` pairs
    pub fn predefined_with(&self, params: &[(String, String)]) -> ParameterStore {
        let overrides: ParameterStore = params
            .iter()
            .map(|(key, value)| (key.clone(), ParameterRef::literal(value)))
            .collect();
        ParameterStore::merge(&self.predefined_store(), &overrides)
    }
}
