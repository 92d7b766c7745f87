//! Aggregate status of one watch.
//!
//! `WatchStatus` owns one [`ActionStatus`] per configured action and fans each
//! condition check out to all of them. Serialization goes through
//! [`RenderParams`]: the `headers` field is hidden unless the caller asks for
//! the internal view.

use crate::action::{ActionResult, ActionStatus};
use crate::definition::ActionDefinition;
use crate::error::{Result, WatcherError};
use crate::params::{RenderParams, StatusDocument};
use crate::types::ExecutionState;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize, Serializer};
use std::collections::BTreeMap;

/// Document field names. Collaborators building render contexts or reading
/// stored documents refer to these.
pub mod field {
    pub const STATE: &str = "state";
    pub const LAST_CHECKED: &str = "last_checked";
    pub const LAST_MET_CONDITION: &str = "last_met_condition";
    pub const ACTIONS: &str = "actions";
    pub const EXECUTION_STATE: &str = "execution_state";
    pub const VERSION: &str = "version";
    pub const HEADERS: &str = "headers";
}

/// Reserved action id meaning "every action on the watch".
pub const ALL_ACTIONS: &str = "_all";

// ---------------------------------------------------------------------------
// WatchState
// ---------------------------------------------------------------------------

/// Activation state of the watch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WatchState {
    pub active: bool,
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
}

impl Default for WatchState {
    fn default() -> Self {
        Self {
            active: true,
            timestamp: None,
        }
    }
}

// ---------------------------------------------------------------------------
// ReconcileReport
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReconcileReport {
    pub added: Vec<String>,
    pub removed: Vec<String>,
}

impl ReconcileReport {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty()
    }
}

// ---------------------------------------------------------------------------
// WatchStatus
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct WatchStatus {
    #[serde(default)]
    version: u64,
    #[serde(default)]
    state: WatchState,
    #[serde(default)]
    last_checked: Option<DateTime<Utc>>,
    #[serde(default)]
    last_met_condition: Option<DateTime<Utc>>,
    actions: BTreeMap<String, ActionStatus>,
    #[serde(default)]
    execution_state: Option<ExecutionState>,
    #[serde(default)]
    headers: Option<BTreeMap<String, String>>,
}

impl WatchStatus {
    pub fn new(
        last_checked: Option<DateTime<Utc>>,
        actions: BTreeMap<String, ActionStatus>,
    ) -> Self {
        Self {
            version: 0,
            state: WatchState::default(),
            last_checked,
            last_met_condition: None,
            actions,
            execution_state: None,
            headers: None,
        }
    }

    /// Seed a status with one fresh action per definition.
    pub fn from_definitions(definitions: &[ActionDefinition], now: DateTime<Utc>) -> Self {
        let actions = definitions
            .iter()
            .map(|d| (d.id.clone(), ActionStatus::with_ackable(now, d.ackable)))
            .collect();
        Self::new(None, actions)
    }

    // -----------------------------------------------------------------------
    // Accessors
    // -----------------------------------------------------------------------

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn state(&self) -> &WatchState {
        &self.state
    }

    pub fn last_checked(&self) -> Option<DateTime<Utc>> {
        self.last_checked
    }

    pub fn last_met_condition(&self) -> Option<DateTime<Utc>> {
        self.last_met_condition
    }

    pub fn execution_state(&self) -> Option<ExecutionState> {
        self.execution_state
    }

    pub fn headers(&self) -> Option<&BTreeMap<String, String>> {
        self.headers.as_ref()
    }

    /// Look up one action. Unknown ids are a normal miss, not an error.
    pub fn action_status(&self, action_id: &str) -> Option<&ActionStatus> {
        self.actions.get(action_id)
    }

    pub fn action_status_mut(&mut self, action_id: &str) -> Option<&mut ActionStatus> {
        self.actions.get_mut(action_id)
    }

    pub fn actions(&self) -> impl Iterator<Item = (&str, &ActionStatus)> {
        self.actions.iter().map(|(id, s)| (id.as_str(), s))
    }

    // -----------------------------------------------------------------------
    // Mutations
    // -----------------------------------------------------------------------

    /// Record a condition check and forward it to every action.
    pub fn on_check(&mut self, condition_met: bool, timestamp: DateTime<Utc>) {
        self.last_checked = Some(timestamp);
        if condition_met {
            self.last_met_condition = Some(timestamp);
        }
        let mut changed = 0usize;
        for status in self.actions.values_mut() {
            if status.on_check(condition_met, timestamp) {
                changed += 1;
            }
        }
        tracing::debug!(
            condition_met,
            actions = self.actions.len(),
            changed,
            "watch checked"
        );
    }

    /// Route an execution outcome to one action. Returns `false` when the
    /// action is not in the map; the caller decides whether that is an error.
    pub fn on_action_result(
        &mut self,
        action_id: &str,
        timestamp: DateTime<Utc>,
        result: ActionResult,
    ) -> bool {
        match self.actions.get_mut(action_id) {
            Some(status) => {
                status.update(timestamp, result);
                true
            }
            None => false,
        }
    }

    /// Acknowledge the listed actions; [`ALL_ACTIONS`] targets every action.
    /// Unknown ids are skipped. Returns the ids that moved to `Acked`, in map
    /// order; empty means nothing changed.
    pub fn on_ack(&mut self, timestamp: DateTime<Utc>, action_ids: &[&str]) -> Vec<String> {
        let all = action_ids.contains(&ALL_ACTIONS);
        self.actions
            .iter_mut()
            .filter(|(id, _)| all || action_ids.contains(&id.as_str()))
            .filter_map(|(id, status)| status.on_ack(timestamp).then(|| id.clone()))
            .collect()
    }

    /// Returns `true` if the activation state changed.
    pub fn set_active(&mut self, active: bool, timestamp: DateTime<Utc>) -> bool {
        if self.state.active == active {
            return false;
        }
        self.state = WatchState {
            active,
            timestamp: Some(timestamp),
        };
        true
    }

    pub fn set_execution_state(&mut self, state: ExecutionState) {
        self.execution_state = Some(state);
    }

    /// Replace the captured headers wholesale.
    pub fn set_headers(&mut self, headers: BTreeMap<String, String>) {
        self.headers = Some(headers);
    }

    pub fn clear_headers(&mut self) {
        self.headers = None;
    }

    pub(crate) fn set_version(&mut self, version: u64) {
        self.version = version;
    }

    /// Bring the action map in line with the watch's configured actions:
    /// missing actions are created fresh, actions no longer configured are
    /// dropped. Existing entries keep their state.
    pub fn reconcile(
        &mut self,
        definitions: &[ActionDefinition],
        now: DateTime<Utc>,
    ) -> ReconcileReport {
        let mut report = ReconcileReport::default();
        for def in definitions {
            if !self.actions.contains_key(&def.id) {
                self.actions
                    .insert(def.id.clone(), ActionStatus::with_ackable(now, def.ackable));
                report.added.push(def.id.clone());
            }
        }
        self.actions.retain(|id, _| {
            let keep = definitions.iter().any(|d| &d.id == id);
            if !keep {
                report.removed.push(id.clone());
            }
            keep
        });
        if !report.removed.is_empty() {
            tracing::warn!(removed = ?report.removed, "dropped status for unconfigured actions");
        }
        report
    }

    // -----------------------------------------------------------------------
    // Documents
    // -----------------------------------------------------------------------

    pub fn with_params(&self, params: &RenderParams) -> StatusDocument<'_> {
        StatusDocument::new(self, *params)
    }

    pub fn to_json(&self, params: &RenderParams) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.with_params(params))?)
    }

    /// Parse a JSON status document. Type and shape errors carry the path of
    /// the offending field (e.g. `actions.email.ack.timestamp`).
    pub fn from_json(data: &str) -> Result<Self> {
        let mut de = serde_json::Deserializer::from_str(data);
        let status = serde_path_to_error::deserialize(&mut de).map_err(|e| {
            WatcherError::Document {
                path: e.path().to_string(),
                source: e.into_inner(),
            }
        })?;
        de.end()?;
        Ok(status)
    }

    pub fn to_yaml(&self, params: &RenderParams) -> Result<String> {
        Ok(serde_yaml::to_string(&self.with_params(params))?)
    }

    pub fn from_yaml(data: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(data)?)
    }
}

/// Plain `serde` serialization renders the external view (headers hidden).
impl Serialize for WatchStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.with_params(&RenderParams::default())
            .serialize(serializer)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
