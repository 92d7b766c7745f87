//! Acknowledgment state machine for a single action.
//!
//! An acknowledgment holds only while the watch condition keeps firing. Once a
//! check reports the condition as unmet, an `Acked` action moves to
//! `AwaitsSuccessfulExecution` and becomes acknowledgeable again only after the
//! action has run successfully.
//!
//! ```text
//! Ackable --ack--> Acked --check(unmet)--> AwaitsSuccessfulExecution
//!    ^                                              |
//!    +---------------successful execution-----------+
//! ```

use crate::types::AckState;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// AckEvent
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AckEvent {
    /// An operator acknowledged the action.
    Ack,
    /// The owning watch finished a condition check.
    Check { condition_met: bool },
    /// The action ran and reported success.
    SuccessfulExecution,
}

/// Pure transition function. Any pair not listed leaves the state unchanged.
pub fn next_state(state: AckState, event: AckEvent) -> AckState {
    match (state, event) {
        (AckState::Ackable, AckEvent::Ack) => AckState::Acked,
        (AckState::Acked, AckEvent::Check { condition_met: false }) => {
            AckState::AwaitsSuccessfulExecution
        }
        (AckState::AwaitsSuccessfulExecution, AckEvent::SuccessfulExecution) => AckState::Ackable,
        (state, _) => state,
    }
}

// ---------------------------------------------------------------------------
// AckStatus
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AckStatus {
    state: AckState,
    timestamp: DateTime<Utc>,
}

impl AckStatus {
    pub fn new(state: AckState, timestamp: DateTime<Utc>) -> Self {
        Self { state, timestamp }
    }

    pub fn ackable(timestamp: DateTime<Utc>) -> Self {
        Self::new(AckState::Ackable, timestamp)
    }

    pub fn not_ackable(timestamp: DateTime<Utc>) -> Self {
        Self::new(AckState::NotAckable, timestamp)
    }

    pub fn state(&self) -> AckState {
        self.state
    }

    /// Time of the last state change.
    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    /// Feed one event through the machine. Returns `true` if the state changed.
    ///
    /// The timestamp is only touched on a change and never moves backwards.
    pub fn apply(&mut self, event: AckEvent, timestamp: DateTime<Utc>) -> bool {
        let next = next_state(self.state, event);
        if next == self.state {
            return false;
        }
        tracing::debug!(from = %self.state, to = %next, ?event, "ack state transition");
        self.state = next;
        self.timestamp = self.timestamp.max(timestamp);
        true
    }

    pub fn on_ack(&mut self, timestamp: DateTime<Utc>) -> bool {
        self.apply(AckEvent::Ack, timestamp)
    }

    pub fn on_check(&mut self, condition_met: bool, timestamp: DateTime<Utc>) -> bool {
        self.apply(AckEvent::Check { condition_met }, timestamp)
    }

    pub fn on_successful_execution(&mut self, timestamp: DateTime<Utc>) -> bool {
        self.apply(AckEvent::SuccessfulExecution, timestamp)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn t(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000, 0).unwrap() + Duration::seconds(secs)
    }

    #[test]
    fn ack_only_from_ackable() {
        assert_eq!(next_state(AckState::Ackable, AckEvent::Ack), AckState::Acked);
        for state in [
            AckState::AwaitsSuccessfulExecution,
            AckState::Acked,
            AckState::NotAckable,
        ] {
            assert_eq!(next_state(state, AckEvent::Ack), state);
        }
    }

    #[test]
    fn unmet_check_only_regresses_acked() {
        let unmet = AckEvent::Check {
            condition_met: false,
        };
        assert_eq!(
            next_state(AckState::Acked, unmet),
            AckState::AwaitsSuccessfulExecution
        );
        assert_eq!(next_state(AckState::Ackable, unmet), AckState::Ackable);
        assert_eq!(next_state(AckState::NotAckable, unmet), AckState::NotAckable);
    }

    #[test]
    fn met_check_never_transitions() {
        let met = AckEvent::Check {
            condition_met: true,
        };
        for state in AckState::all() {
            assert_eq!(next_state(*state, met), *state);
        }
    }

    #[test]
    fn successful_execution_clears_hold() {
        assert_eq!(
            next_state(
                AckState::AwaitsSuccessfulExecution,
                AckEvent::SuccessfulExecution
            ),
            AckState::Ackable
        );
        assert_eq!(
            next_state(AckState::Acked, AckEvent::SuccessfulExecution),
            AckState::Acked
        );
    }

    #[test]
    fn repeated_ack_keeps_first_timestamp() {
        let mut ack = AckStatus::ackable(t(0));
        assert!(ack.on_ack(t(5)));
        assert!(!ack.on_ack(t(10)));
        assert!(!ack.on_ack(t(20)));
        assert_eq!(ack.state(), AckState::Acked);
        assert_eq!(ack.timestamp(), t(5));
    }

    #[test]
    fn not_ackable_is_terminal() {
        let mut ack = AckStatus::not_ackable(t(0));
        assert!(!ack.on_ack(t(1)));
        assert!(!ack.on_check(false, t(2)));
        assert!(!ack.on_successful_execution(t(3)));
        assert_eq!(ack.state(), AckState::NotAckable);
        assert_eq!(ack.timestamp(), t(0));
    }

    #[test]
    fn timestamp_never_moves_backwards() {
        let mut ack = AckStatus::ackable(t(100));
        assert!(ack.on_ack(t(50)));
        assert_eq!(ack.state(), AckState::Acked);
        assert_eq!(ack.timestamp(), t(100));
    }

    #[test]
    fn serializes_snake_case_state() {
        let ack = AckStatus::new(AckState::AwaitsSuccessfulExecution, t(0));
        let json = serde_json::to_value(&ack).unwrap();
        assert_eq!(json["state"], "awaits_successful_execution");
        assert!(json["timestamp"].is_string());
    }
}
