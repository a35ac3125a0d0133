//! Agent inventory read from a YAML file

use crate::agent::{Agent, AgentProvider};
use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// A fixed list of agents, usually loaded from disk
///
/// ```yaml
/// agents:
///   - id: mac-mini-1
///     attributes:
///       teamcity.agent.jvm.os.name: Mac OS X
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentInventory {
    #[serde(default)]
    pub agents: Vec<Agent>,
}

impl AgentInventory {
    pub fn new(agents: Vec<Agent>) -> Self {
        Self { agents }
    }

    /// Load an inventory from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read agent inventory: {}", path.display()))?;
        Self::from_yaml(&content)
    }

    /// Parse an inventory from a YAML string
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let inventory: AgentInventory =
            serde_yaml::from_str(yaml).context("Failed to parse agent inventory YAML")?;

        let mut seen = std::collections::HashSet::new();
        for agent in &inventory.agents {
            if !seen.insert(agent.id.as_str()) {
                anyhow::bail!("Duplicate agent id in inventory: {}", agent.id);
            }
        }

        Ok(inventory)
    }
}

#[async_trait]
impl AgentProvider for AgentInventory {
    async fn agents(&self) -> Result<Vec<Agent>> {
        Ok(self.agents.clone())
    }
}
