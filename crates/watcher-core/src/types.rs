use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// AckState
// ---------------------------------------------------------------------------

/// Acknowledgment state of a single action.
///
/// `NotAckable` is assigned at construction for actions that cannot be
/// acknowledged and is never entered or left through a transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AckState {
    Ackable,
    AwaitsSuccessfulExecution,
    Acked,
    NotAckable,
}

impl AckState {
    pub fn all() -> &'static [AckState] {
        &[
            AckState::Ackable,
            AckState::AwaitsSuccessfulExecution,
            AckState::Acked,
            AckState::NotAckable,
        ]
    }

    pub fn as_str(self) -> &'static str {
        match self {
            AckState::Ackable => "ackable",
            AckState::AwaitsSuccessfulExecution => "awaits_successful_execution",
            AckState::Acked => "acked",
            AckState::NotAckable => "not_ackable",
        }
    }
}

impl fmt::Display for AckState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// ExecutionState
// ---------------------------------------------------------------------------

/// Outcome of the most recent watch execution, as reported by the execution
/// engine. Stored and exposed, never interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionState {
    AwaitsExecution,
    ExecutionNotNeeded,
    Throttled,
    Acked,
    Executed,
    Failed,
}

impl ExecutionState {
    pub fn as_str(self) -> &'static str {
        match self {
            ExecutionState::AwaitsExecution => "awaits_execution",
            ExecutionState::ExecutionNotNeeded => "execution_not_needed",
            ExecutionState::Throttled => "throttled",
            ExecutionState::Acked => "acked",
            ExecutionState::Executed => "executed",
            ExecutionState::Failed => "failed",
        }
    }
}

impl fmt::Display for ExecutionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ExecutionState {
    type Err = crate::error::WatcherError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "awaits_execution" => Ok(ExecutionState::AwaitsExecution),
            "execution_not_needed" => Ok(ExecutionState::ExecutionNotNeeded),
            "throttled" => Ok(ExecutionState::Throttled),
            "acked" => Ok(ExecutionState::Acked),
            "executed" => Ok(ExecutionState::Executed),
            "failed" => Ok(ExecutionState::Failed),
            _ => Err(crate::error::WatcherError::InvalidExecutionState(
                s.to_string(),
            )),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
