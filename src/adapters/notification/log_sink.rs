//! Notification sink that writes to the tracing log.
//!
//! Stands in for a real delivery channel until one is wired.

use async_trait::async_trait;
use tracing::info;

use crate::ports::{Notification, NotificationError, NotificationSink};

#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotificationSink;

#[async_trait]
impl NotificationSink for LogNotificationSink {
    async fn notify(&self, notification: Notification) -> Result<(), NotificationError> {
        info!(
            tenant_id = %notification.tenant_id,
            recipient = %notification.recipient,
            session_id = notification.metadata.get("session_id").map(String::as_str).unwrap_or(""),
            title = %notification.title,
            message = %notification.message,
            "Operator notification"
        );
        Ok(())
    }
}
