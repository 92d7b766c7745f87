use crate::ack::AckStatus;
use crate::error::WatcherError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// ActionResult
// ---------------------------------------------------------------------------

/// Outcome of one action run, as reported by the execution engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ActionResult {
    Success {
        #[serde(default)]
        summary: Option<String>,
    },
    Failure {
        reason: String,
    },
    /// The action was due but suppressed. Not an execution.
    Throttled {
        reason: String,
    },
}

impl ActionResult {
    pub fn success(summary: impl Into<String>) -> Self {
        ActionResult::Success {
            summary: Some(summary.into()),
        }
    }

    pub fn failure(reason: impl Into<String>) -> Self {
        ActionResult::Failure {
            reason: reason.into(),
        }
    }

    pub fn throttled(reason: impl Into<String>) -> Self {
        ActionResult::Throttled {
            reason: reason.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, ActionResult::Success { .. })
    }

    /// Build a result from a status keyword and an optional reason. On
    /// success the reason is kept as the execution summary.
    pub fn parse(status: &str, reason: Option<String>) -> crate::error::Result<Self> {
        match status {
            "success" => Ok(ActionResult::Success { summary: reason }),
            "failure" => Ok(ActionResult::Failure {
                reason: reason.unwrap_or_default(),
            }),
            "throttled" => Ok(ActionResult::Throttled {
                reason: reason.unwrap_or_default(),
            }),
            _ => Err(WatcherError::InvalidActionResult(status.to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// Execution / Throttle records
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Execution {
    pub timestamp: DateTime<Utc>,
    pub successful: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Throttle {
    pub timestamp: DateTime<Utc>,
    pub reason: String,
}

// ---------------------------------------------------------------------------
// ActionStatus
// ---------------------------------------------------------------------------

/// Per-action status: ack machine plus the latest execution records.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionStatus {
    ack: AckStatus,
    #[serde(default)]
    last_execution: Option<Execution>,
    #[serde(default)]
    last_successful_execution: Option<Execution>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    last_throttle: Option<Throttle>,
}

impl ActionStatus {
    /// A fresh, acknowledgeable action.
    pub fn new(now: DateTime<Utc>) -> Self {
        Self::with_ackable(now, true)
    }

    /// Actions whose type does not support acknowledgment start (and stay)
    /// `NotAckable`.
    pub fn with_ackable(now: DateTime<Utc>, ackable: bool) -> Self {
        let ack = if ackable {
            AckStatus::ackable(now)
        } else {
            AckStatus::not_ackable(now)
        };
        Self {
            ack,
            last_execution: None,
            last_successful_execution: None,
            last_throttle: None,
        }
    }

    pub fn ack_status(&self) -> &AckStatus {
        &self.ack
    }

    pub fn last_execution(&self) -> Option<&Execution> {
        self.last_execution.as_ref()
    }

    pub fn last_successful_execution(&self) -> Option<&Execution> {
        self.last_successful_execution.as_ref()
    }

    pub fn last_throttle(&self) -> Option<&Throttle> {
        self.last_throttle.as_ref()
    }

    /// Record the outcome of a run.
    pub fn update(&mut self, timestamp: DateTime<Utc>, result: ActionResult) {
        match result {
            ActionResult::Success { summary } => {
                let execution = Execution {
                    timestamp,
                    successful: true,
                    summary,
                };
                self.last_successful_execution = Some(execution.clone());
                self.last_execution = Some(execution);
                self.ack.on_successful_execution(timestamp);
            }
            ActionResult::Failure { reason } => {
                self.last_execution = Some(Execution {
                    timestamp,
                    successful: false,
                    summary: Some(reason),
                });
            }
            ActionResult::Throttled { reason } => {
                self.last_throttle = Some(Throttle { timestamp, reason });
            }
        }
    }

    /// Returns `true` if the action moved to `Acked`.
    pub fn on_ack(&mut self, timestamp: DateTime<Utc>) -> bool {
        self.ack.on_ack(timestamp)
    }

    pub fn on_check(&mut self, condition_met: bool, timestamp: DateTime<Utc>) -> bool {
        self.ack.on_check(condition_met, timestamp)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::AckState;
    use chrono::{Duration, TimeZone};

    fn t(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000, 0).unwrap() + Duration::seconds(secs)
    }

    #[test]
    fn new_action_is_ackable_with_no_history() {
        let status = ActionStatus::new(t(0));
        assert_eq!(status.ack_status().state(), AckState::Ackable);
        assert_eq!(status.ack_status().timestamp(), t(0));
        assert!(status.last_execution().is_none());
        assert!(status.last_successful_execution().is_none());
    }

    #[test]
    fn success_records_both_executions() {
        let mut status = ActionStatus::new(t(0));
        status.update(t(1), ActionResult::success("logged"));
        let last = status.last_execution().unwrap();
        assert!(last.successful);
        assert_eq!(last.timestamp, t(1));
        assert_eq!(last.summary.as_deref(), Some("logged"));
        assert_eq!(status.last_successful_execution(), Some(last));
    }

    #[test]
    fn failure_keeps_previous_success() {
        let mut status = ActionStatus::new(t(0));
        status.update(t(1), ActionResult::success("ok"));
        status.update(t(2), ActionResult::failure("smtp timeout"));

        let last = status.last_execution().unwrap();
        assert!(!last.successful);
        assert_eq!(last.summary.as_deref(), Some("smtp timeout"));
        assert_eq!(status.last_successful_execution().unwrap().timestamp, t(1));
    }

    #[test]
    fn throttle_does_not_count_as_execution() {
        let mut status = ActionStatus::new(t(0));
        status.update(t(1), ActionResult::throttled("within throttle period"));
        assert!(status.last_execution().is_none());
        assert_eq!(status.last_throttle().unwrap().timestamp, t(1));
    }

    #[test]
    fn success_reopens_awaiting_action() {
        let mut status = ActionStatus::new(t(0));
        status.update(t(1), ActionResult::success("ok"));
        assert!(status.on_ack(t(2)));
        assert!(status.on_check(false, t(3)));
        assert_eq!(
            status.ack_status().state(),
            AckState::AwaitsSuccessfulExecution
        );

        status.update(t(4), ActionResult::failure("boom"));
        assert_eq!(
            status.ack_status().state(),
            AckState::AwaitsSuccessfulExecution
        );

        status.update(t(5), ActionResult::success("ok"));
        assert_eq!(status.ack_status().state(), AckState::Ackable);
        assert_eq!(status.ack_status().timestamp(), t(5));
    }

    #[test]
    fn success_does_not_clear_an_ack() {
        let mut status = ActionStatus::new(t(0));
        status.on_ack(t(1));
        status.update(t(2), ActionResult::success("ok"));
        assert_eq!(status.ack_status().state(), AckState::Acked);
    }

    #[test]
    fn unackable_action_ignores_ack() {
        let mut status = ActionStatus::with_ackable(t(0), false);
        assert!(!status.on_ack(t(1)));
        assert_eq!(status.ack_status().state(), AckState::NotAckable);
    }

    #[test]
    fn parse_result_keywords() {
        assert!(ActionResult::parse("success", None).unwrap().is_success());
        assert_eq!(
            ActionResult::parse("failure", Some("down".to_string())).unwrap(),
            ActionResult::failure("down")
        );
        assert!(ActionResult::parse("exploded", None).is_err());
    }

    #[test]
    fn missing_ack_field_is_named() {
        let err = serde_json::from_str::<ActionStatus>(r#"{"last_execution": null}"#)
            .unwrap_err()
            .to_string();
        assert!(err.contains("ack"), "{err}");
    }
}
