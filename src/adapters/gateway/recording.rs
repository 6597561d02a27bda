//! Recording gateway for tests and dry runs.
//!
//! Keeps every sent message in memory and can be told to fail the next
//! sends.

use async_trait::async_trait;
use tracing::debug;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::domain::profile::ChannelAddress;
use crate::ports::{Contact, ContactDirectory, GatewayError, MessageGateway};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentMessage {
    pub to: ChannelAddress,
    pub text: String,
}

#[derive(Debug, Clone, Default)]
pub struct RecordingGateway {
    sent: Arc<Mutex<Vec<SentMessage>>>,
    failures: Arc<Mutex<Vec<GatewayError>>>,
    contacts: Arc<Mutex<Vec<Contact>>>,
}

fn locked<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl RecordingGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue an error for the next send.
    pub fn fail_next(&self, error: GatewayError) {
        locked(&self.failures).push(error);
    }

    pub fn with_contacts(self, contacts: Vec<Contact>) -> Self {
        *locked(&self.contacts) = contacts;
        self
    }

    pub fn sent(&self) -> Vec<SentMessage> {
        locked(&self.sent).clone()
    }

    pub fn sent_texts(&self) -> Vec<String> {
        locked(&self.sent).iter().map(|m| m.text.clone()).collect()
    }
}

#[async_trait]
impl MessageGateway for RecordingGateway {
    async fn send(&self, to: &ChannelAddress, text: &str) -> Result<(), GatewayError> {
        let queued = {
            let mut failures = locked(&self.failures);
            (!failures.is_empty()).then(|| failures.remove(0))
        };
        if let Some(err) = queued {
            return Err(err);
        }
        debug!(to = %to, text, "Recorded outbound message");
        locked(&self.sent).push(SentMessage {
            to: to.clone(),
            text: text.to_string(),
        });
        Ok(())
    }
}

#[async_trait]
impl ContactDirectory for RecordingGateway {
    async fn list_contacts(&self) -> Result<Vec<Contact>, GatewayError> {
        Ok(locked(&self.contacts).clone())
    }
}
