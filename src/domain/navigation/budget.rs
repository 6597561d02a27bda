//! Message budget safety bound.

use serde::{Deserialize, Serialize};

/// Where the outbound message ceiling comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CeilingPolicy {
    /// One global ceiling for every profile.
    #[default]
    Fixed,
    /// Each profile's `max_retries` is its ceiling.
    ProfileMaxRetries,
}

/// Hard cap on the messages we send in one session.
///
/// Checked on every responder turn before the decision output is acted on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MessageBudget {
    ceiling: u32,
}

impl MessageBudget {
    pub fn fixed(ceiling: u32) -> Self {
        Self {
            ceiling: ceiling.max(1),
        }
    }

    /// Resolves the ceiling for one profile.
    pub fn resolve(policy: CeilingPolicy, fixed_ceiling: u32, profile_max_retries: u32) -> Self {
        match policy {
            CeilingPolicy::Fixed => Self::fixed(fixed_ceiling),
            CeilingPolicy::ProfileMaxRetries => Self::fixed(profile_max_retries),
        }
    }

    pub fn ceiling(&self) -> u32 {
        self.ceiling
    }

    /// True once `messages_sent` reached the ceiling.
    pub fn is_exhausted(&self, messages_sent: u32) -> bool {
        messages_sent >= self.ceiling
    }

    pub fn remaining(&self, messages_sent: u32) -> u32 {
        self.ceiling.saturating_sub(messages_sent)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_policy_ignores_profile() {
        let budget = MessageBudget::resolve(CeilingPolicy::Fixed, 20, 3);
        assert_eq!(budget.ceiling(), 20);
    }

    #[test]
    fn profile_policy_uses_max_retries() {
        let budget = MessageBudget::resolve(CeilingPolicy::ProfileMaxRetries, 20, 3);
        assert_eq!(budget.ceiling(), 3);
    }

    #[test]
    fn exhausted_at_ceiling() {
        let budget = MessageBudget::fixed(20);
        assert!(!budget.is_exhausted(19));
        assert!(budget.is_exhausted(20));
        assert!(budget.is_exhausted(21));
        assert_eq!(budget.remaining(25), 0);
    }

    #[test]
    fn zero_ceiling_still_allows_opening_message() {
        let budget = MessageBudget::resolve(CeilingPolicy::ProfileMaxRetries, 20, 0);
        assert_eq!(budget.ceiling(), 1);
    }

    #[test]
    fn policy_deserializes_from_snake_case() {
        let policy: CeilingPolicy = serde_json::from_str("\"profile_max_retries\"").unwrap();
        assert_eq!(policy, CeilingPolicy::ProfileMaxRetries);
    }
}
