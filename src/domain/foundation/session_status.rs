//! SessionStatus enum for tracking the lifecycle of navigation sessions.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::{StateMachine, ValidationError};

/// Lifecycle status of a navigation session.
///
/// ```text
/// pending -> navigating <-> waiting_response -> {completed | failed}
/// ```
///
/// Every non-terminal status may also jump straight to `failed`
/// (expiry, dispatch failure, cancellation).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    #[default]
    Pending,
    Navigating,
    WaitingResponse,
    Completed,
    Failed,
}

impl SessionStatus {
    /// All statuses, in lifecycle order.
    pub const ALL: [SessionStatus; 5] = [
        SessionStatus::Pending,
        SessionStatus::Navigating,
        SessionStatus::WaitingResponse,
        SessionStatus::Completed,
        SessionStatus::Failed,
    ];

    /// Statuses counted against the one-active-session-per-profile rule.
    pub const ACTIVE: [SessionStatus; 3] = [
        SessionStatus::Pending,
        SessionStatus::Navigating,
        SessionStatus::WaitingResponse,
    ];

    /// Returns true while the conversation may still change.
    pub fn is_active(&self) -> bool {
        !self.is_terminal()
    }

    /// Wire/storage representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionStatus::Pending => "pending",
            SessionStatus::Navigating => "navigating",
            SessionStatus::WaitingResponse => "waiting_response",
            SessionStatus::Completed => "completed",
            SessionStatus::Failed => "failed",
        }
    }
}

impl StateMachine for SessionStatus {
    fn can_transition_to(&self, target: &Self) -> bool {
        use SessionStatus::*;
        matches!(
            (self, target),
            (Pending, Navigating)
                | (Pending, WaitingResponse)
                | (Pending, Failed)
                | (Navigating, WaitingResponse)
                | (Navigating, Completed)
                | (Navigating, Failed)
                | (WaitingResponse, Navigating)
                | (WaitingResponse, Completed)
                | (WaitingResponse, Failed)
        )
    }

    fn valid_transitions(&self) -> Vec<Self> {
        use SessionStatus::*;
        match self {
            Pending => vec![Navigating, WaitingResponse, Failed],
            Navigating => vec![WaitingResponse, Completed, Failed],
            WaitingResponse => vec![Navigating, Completed, Failed],
            Completed | Failed => vec![],
        }
    }
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for SessionStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SessionStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| ValidationError::invalid_format("status", format!("unknown status '{}'", s)))
    }
}
