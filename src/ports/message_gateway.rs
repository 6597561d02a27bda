//! Messaging gateway port.

use async_trait::async_trait;

use crate::domain::profile::ChannelAddress;

/// Delivers text to an external responder over the messaging channel.
#[async_trait]
pub trait MessageGateway: Send + Sync {
    /// Hand `text` to the transport. `Ok` means the gateway accepted it.
    async fn send(&self, to: &ChannelAddress, text: &str) -> Result<(), GatewayError>;
}

/// Messaging gateway errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GatewayError {
    #[error("gateway rejected message: status {status}: {message}")]
    Rejected { status: u16, message: String },

    #[error("gateway unreachable: {0}")]
    Network(String),

    #[error("gateway timed out after {0}s")]
    Timeout(u64),

    #[error("unexpected gateway response: {0}")]
    Parse(String),
}
