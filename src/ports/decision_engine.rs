//! Decision engine port.
//!
//! The reasoning capability behind a navigation turn. The engine treats it as
//! an opaque generator and classifier; every error it returns is recovered
//! by the caller (wait, or a fixed fallback text) rather than surfaced.

use async_trait::async_trait;

use crate::domain::intent::{IntentCandidate, IntentClassification};
use crate::domain::navigation::{DecisionOutput, DecisionRequest, GenerationRequest, SummaryRequest};

/// Port for the decision function.
#[async_trait]
pub trait DecisionEngine: Send + Sync {
    /// Write the opening message for a new session.
    ///
    /// An empty string means "nothing usable"; the caller falls back.
    async fn generate(&self, request: &GenerationRequest) -> Result<String, DecisionError>;

    /// Choose the next action after a responder message.
    async fn decide(&self, request: &DecisionRequest) -> Result<DecisionOutput, DecisionError>;

    /// Short human-readable summary of a completed session.
    async fn summarize(&self, request: &SummaryRequest) -> Result<String, DecisionError>;

    /// Map operator text to one of `candidates`, if it asks for automation.
    async fn classify_intent(
        &self,
        text: &str,
        candidates: &[IntentCandidate],
    ) -> Result<IntentClassification, DecisionError>;
}

/// Decision engine errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecisionError {
    /// The reasoning backend failed or was unreachable.
    #[error("decision backend failed: {0}")]
    Backend(String),

    /// The backend answered with something that does not fit the contract.
    #[error("malformed decision output: {0}")]
    Malformed(String),

    #[error("decision timed out after {0}s")]
    Timeout(u64),
}

impl DecisionError {
    pub fn backend(message: impl Into<String>) -> Self {
        Self::Backend(message.into())
    }

    pub fn malformed(message: impl Into<String>) -> Self {
        Self::Malformed(message.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decision_engine_is_object_safe() {
        fn _accepts_dyn(_engine: &dyn DecisionEngine) {}
    }

    #[test]
    fn timeout_displays_seconds() {
        assert_eq!(DecisionError::Timeout(60).to_string(), "decision timed out after 60s");
    }
}
