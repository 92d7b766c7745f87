use crate::error::{Result, WatcherError};
use crate::paths;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionDefinition {
    pub id: String,
    /// `false` for action types that cannot be acknowledged.
    #[serde(default = "default_ackable")]
    pub ackable: bool,
}

fn default_ackable() -> bool {
    true
}

impl ActionDefinition {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ackable: true,
        }
    }

    pub fn unackable(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ackable: false,
        }
    }

    /// Parse a CLI spec of the form `id` or `id:unackable`.
    pub fn parse(spec: &str) -> Self {
        match spec.split_once(':') {
            Some((id, "unackable")) => Self::unackable(id),
            _ => Self::new(spec),
        }
    }
}

/// The configured shape of a watch: which actions it has.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WatchDefinition {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub actions: Vec<ActionDefinition>,
    pub created_at: DateTime<Utc>,
}

impl WatchDefinition {
    pub fn new(id: impl Into<String>, actions: Vec<ActionDefinition>) -> Self {
        Self {
            id: id.into(),
            description: None,
            actions,
            created_at: Utc::now(),
        }
    }

    pub fn action(&self, id: &str) -> Option<&ActionDefinition> {
        self.actions.iter().find(|a| a.id == id)
    }

    pub fn load(root: &Path, id: &str) -> Result<Self> {
        let path = paths::definition_path(root, id);
        if !path.exists() {
            return Err(WatcherError::WatchNotFound(id.to_string()));
        }
        let data = std::fs::read_to_string(&path)?;
        Ok(serde_yaml::from_str(&data)?)
    }

    pub fn save(&self, root: &Path) -> Result<()> {
        let path = paths::definition_path(root, &self.id);
        let data = serde_yaml::to_string(self)?;
        crate::io::atomic_write(&path, data.as_bytes())
    }
}
