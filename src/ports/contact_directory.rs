//! Contact directory port.
//!
//! Lists the contacts known to the messaging channel so operators can pick
//! responders that have no profile yet.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::GatewayError;
use crate::domain::profile::ChannelAddress;

/// A contact as reported by the messaging channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contact {
    pub address: ChannelAddress,
    pub display_name: Option<String>,
    /// Channels flag business accounts; automated responders usually are.
    pub is_business: bool,
}

#[async_trait]
pub trait ContactDirectory: Send + Sync {
    async fn list_contacts(&self) -> Result<Vec<Contact>, GatewayError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn contact_directory_is_object_safe() {
        fn _accepts_dyn(_directory: &dyn ContactDirectory) {}
    }
}
