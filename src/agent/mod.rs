//! Build agents and the sources that report them

pub mod inventory;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub use inventory::AgentInventory;

/// A build agent as seen by the matcher: an id and its reported attributes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Agent {
    pub id: String,
    #[serde(default)]
    pub attributes: BTreeMap<String, String>,
}

impl Agent {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            attributes: BTreeMap::new(),
        }
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }
}

/// Source of the current agent pool
#[async_trait]
pub trait AgentProvider: Send + Sync {
    /// List the agents currently available
    async fn agents(&self) -> anyhow::Result<Vec<Agent>>;
}
