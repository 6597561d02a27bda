//! Navigation and intent detection configuration

use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;
use crate::application::navigation::NavigationSettings;
use crate::domain::intent::IntentFilter;
use crate::domain::navigation::{CeilingPolicy, ReplyDelay, DEFAULT_TRANSCRIPT_TAIL};

#[derive(Debug, Clone, Deserialize)]
pub struct NavigationConfig {
    #[serde(default)]
    pub ceiling_policy: CeilingPolicy,

    /// Ceiling under the `fixed` policy
    #[serde(default = "default_message_ceiling")]
    pub message_ceiling: u32,

    #[serde(default = "default_delay_min")]
    pub reply_delay_min_ms: u64,

    #[serde(default = "default_delay_max")]
    pub reply_delay_max_ms: u64,

    #[serde(default = "default_decision_timeout")]
    pub decision_timeout_secs: u64,

    /// Log entries shown to the decision function
    #[serde(default = "default_transcript_tail")]
    pub transcript_tail: usize,

    #[serde(default = "default_sweep_interval")]
    pub sweep_interval_secs: u64,

    /// Session lifetime for profiles that leave max wait unset
    #[serde(default = "default_max_wait")]
    pub default_max_wait_secs: u32,
}

impl NavigationConfig {
    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs)
    }

    pub fn decision_timeout(&self) -> Duration {
        Duration::from_secs(self.decision_timeout_secs)
    }

    /// Engine settings; `dispatch_timeout` comes from the gateway section.
    pub fn settings(&self, dispatch_timeout: Duration) -> Result<NavigationSettings, ValidationError> {
        let reply_delay = ReplyDelay::new(self.reply_delay_min_ms, self.reply_delay_max_ms)
            .map_err(|_| ValidationError::InvalidReplyDelay)?;
        Ok(NavigationSettings {
            ceiling_policy: self.ceiling_policy,
            message_ceiling: self.message_ceiling,
            reply_delay,
            decision_timeout: self.decision_timeout(),
            dispatch_timeout,
            transcript_tail: self.transcript_tail,
        })
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.message_ceiling == 0 {
            return Err(ValidationError::InvalidMessageCeiling);
        }
        if self.reply_delay_min_ms > self.reply_delay_max_ms {
            return Err(ValidationError::InvalidReplyDelay);
        }
        if self.decision_timeout_secs == 0 {
            return Err(ValidationError::InvalidInterval("decision_timeout_secs"));
        }
        if self.sweep_interval_secs == 0 {
            return Err(ValidationError::InvalidInterval("sweep_interval_secs"));
        }
        if self.transcript_tail == 0 {
            return Err(ValidationError::InvalidInterval("transcript_tail"));
        }
        if self.default_max_wait_secs == 0 {
            return Err(ValidationError::InvalidInterval("default_max_wait_secs"));
        }
        Ok(())
    }
}

impl Default for NavigationConfig {
    fn default() -> Self {
        Self {
            ceiling_policy: CeilingPolicy::default(),
            message_ceiling: default_message_ceiling(),
            reply_delay_min_ms: default_delay_min(),
            reply_delay_max_ms: default_delay_max(),
            decision_timeout_secs: default_decision_timeout(),
            transcript_tail: default_transcript_tail(),
            sweep_interval_secs: default_sweep_interval(),
            default_max_wait_secs: default_max_wait(),
        }
    }
}

fn default_message_ceiling() -> u32 {
    20
}

fn default_delay_min() -> u64 {
    ReplyDelay::DEFAULT_MIN_MS
}

fn default_delay_max() -> u64 {
    ReplyDelay::DEFAULT_MAX_MS
}

fn default_decision_timeout() -> u64 {
    60
}

fn default_transcript_tail() -> usize {
    DEFAULT_TRANSCRIPT_TAIL
}

fn default_sweep_interval() -> u64 {
    60
}

fn default_max_wait() -> u32 {
    300
}

/// Intent detector configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct IntentConfig {
    /// Pre-filter keywords (comma-separated); built-in list when unset
    pub keywords: Option<String>,
}

impl IntentConfig {
    pub fn filter(&self) -> IntentFilter {
        match &self.keywords {
            Some(raw) => IntentFilter::new(raw.split(',').map(str::to_string).collect()),
            None => IntentFilter::default(),
        }
    }
}
