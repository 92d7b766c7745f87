use crate::definition::WatchDefinition;
use crate::error::{Result, WatcherError};
use crate::paths;
use crate::watch::ALL_ACTIONS;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

// ---------------------------------------------------------------------------
// ConfigWarning / WarnLevel
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigWarning {
    pub level: WarnLevel,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarnLevel {
    Warning,
    Error,
}

// ---------------------------------------------------------------------------
// ReconcilePolicy
// ---------------------------------------------------------------------------

/// What happens when a watch's configured actions and its stored action
/// statuses drift apart.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReconcilePolicy {
    /// Reconcile against the definition before every check and result.
    #[default]
    OnCheck,
    /// Only reconcile when explicitly asked; results for unknown actions fail.
    Manual,
}

// ---------------------------------------------------------------------------
// WatcherConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WatcherConfig {
    #[serde(default = "default_version")]
    pub version: u32,
    pub name: String,
    #[serde(default)]
    pub reconcile: ReconcilePolicy,
}

fn default_version() -> u32 {
    1
}

impl WatcherConfig {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            version: 1,
            name: name.into(),
            reconcile: ReconcilePolicy::default(),
        }
    }

    pub fn load(root: &Path) -> Result<Self> {
        let path = paths::config_path(root);
        if !path.exists() {
            return Err(WatcherError::NotInitialized);
        }
        let data = std::fs::read_to_string(&path)?;
        Ok(serde_yaml::from_str(&data)?)
    }

    pub fn save(&self, root: &Path) -> Result<()> {
        let path = paths::config_path(root);
        let data = serde_yaml::to_string(self)?;
        crate::io::atomic_write(&path, data.as_bytes())
    }

    pub fn validate(&self) -> Vec<ConfigWarning> {
        let mut warnings = Vec::new();
        if self.version != 1 {
            warnings.push(ConfigWarning {
                level: WarnLevel::Error,
                message: format!("unsupported config version {}", self.version),
            });
        }
        if self.name.trim().is_empty() {
            warnings.push(ConfigWarning {
                level: WarnLevel::Warning,
                message: "config name is empty".to_string(),
            });
        }
        warnings
    }
}

/// Check a watch definition for action ids the status model cannot hold.
pub fn validate_definition(def: &WatchDefinition) -> Vec<ConfigWarning> {
    let mut warnings = Vec::new();

    if def.actions.is_empty() {
        warnings.push(ConfigWarning {
            level: WarnLevel::Warning,
            message: format!("watch '{}' has no actions", def.id),
        });
    }

    let mut seen = HashSet::new();
    for action in &def.actions {
        if action.id.trim().is_empty() {
            warnings.push(ConfigWarning {
                level: WarnLevel::Error,
                message: format!("watch '{}' has an action with an empty id", def.id),
            });
        } else if action.id == ALL_ACTIONS {
            warnings.push(ConfigWarning {
                level: WarnLevel::Error,
                message: format!(
                    "watch '{}' uses reserved action id '{ALL_ACTIONS}'",
                    def.id
                ),
            });
        }
        if !seen.insert(action.id.as_str()) {
            warnings.push(ConfigWarning {
                level: WarnLevel::Error,
                message: format!("watch '{}' defines action '{}' twice", def.id, action.id),
            });
        }
    }

    warnings
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
