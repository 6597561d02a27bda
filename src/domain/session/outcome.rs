//! Terminal outcome of a session.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{Timestamp, ValidationError};

/// Why a session ended in `failed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// The decision function judged the objective unreachable.
    Declined,
    /// The opening message could not be generated.
    Generation,
    /// The gateway refused or timed out a send.
    Dispatch,
    /// The message ceiling was reached.
    BudgetExhausted,
    /// The session outlived its deadline.
    Timeout,
    /// An operator cancelled the session.
    Cancelled,
}

impl FailureKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureKind::Declined => "declined",
            FailureKind::Generation => "generation",
            FailureKind::Dispatch => "dispatch",
            FailureKind::BudgetExhausted => "budget_exhausted",
            FailureKind::Timeout => "timeout",
            FailureKind::Cancelled => "cancelled",
        }
    }

    pub fn parse(s: &str) -> Result<Self, ValidationError> {
        match s {
            "declined" => Ok(FailureKind::Declined),
            "generation" => Ok(FailureKind::Generation),
            "dispatch" => Ok(FailureKind::Dispatch),
            "budget_exhausted" => Ok(FailureKind::BudgetExhausted),
            "timeout" => Ok(FailureKind::Timeout),
            "cancelled" => Ok(FailureKind::Cancelled),
            other => Err(ValidationError::invalid_format(
                "failure_kind",
                format!("unknown failure kind '{}'", other),
            )),
        }
    }
}

/// A failure reason with its category.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailureReason {
    pub kind: FailureKind,
    pub message: String,
}

impl FailureReason {
    pub fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn timeout() -> Self {
        Self::new(FailureKind::Timeout, "expired by timeout")
    }

    pub fn budget_exhausted(ceiling: u32) -> Self {
        Self::new(
            FailureKind::BudgetExhausted,
            format!("message budget exhausted ({} messages sent)", ceiling),
        )
    }

    pub fn cancelled() -> Self {
        Self::new(FailureKind::Cancelled, "cancelled by operator")
    }
}

/// Recorded once a session reaches `completed` or `failed`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionOutcome {
    pub success: bool,
    /// Usable result text (completed sessions only).
    pub result: Option<String>,
    /// Short human-readable summary.
    pub summary: String,
    pub failure_kind: Option<FailureKind>,
    /// Always present, so no terminal state is silent.
    pub reason: String,
    pub finished_at: Timestamp,
}
