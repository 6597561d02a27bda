//! Notification sink port.
//!
//! Results go back to the operator who asked for the automation. Delivery is
//! fire-and-forget: a failed notification never rolls back the session.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::domain::foundation::{OperatorId, TenantId};

/// Structured notification for one operator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub tenant_id: TenantId,
    pub recipient: OperatorId,
    pub title: String,
    pub message: String,
    pub metadata: BTreeMap<String, String>,
}

impl Notification {
    pub fn new(
        tenant_id: TenantId,
        recipient: OperatorId,
        title: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            tenant_id,
            recipient,
            title: title.into(),
            message: message.into(),
            metadata: BTreeMap::new(),
        }
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }
}

#[async_trait]
pub trait NotificationSink: Send + Sync {
    async fn notify(&self, notification: Notification) -> Result<(), NotificationError>;
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NotificationError {
    #[error("notification delivery failed: {0}")]
    Delivery(String),
}
