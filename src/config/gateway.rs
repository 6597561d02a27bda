//! Messaging gateway configuration

use secrecy::{ExposeSecret, Secret};
use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;

/// Longest a single send may take before the session is failed.
pub const MAX_SEND_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Clone, Deserialize)]
pub struct GatewayConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Gateway instance (connected phone) to send from
    #[serde(default = "default_instance")]
    pub instance: String,

    /// Without a key outbound messages are only recorded and logged.
    pub api_key: Option<Secret<String>>,

    #[serde(default = "default_send_timeout")]
    pub send_timeout_secs: u64,

    /// HMAC-SHA256 key for inbound webhook signatures
    pub webhook_secret: Option<Secret<String>>,
}

impl GatewayConfig {
    pub fn send_timeout(&self) -> Duration {
        Duration::from_secs(self.send_timeout_secs)
    }

    pub fn api_key(&self) -> Option<&Secret<String>> {
        self.api_key.as_ref().filter(|k| !k.expose_secret().is_empty())
    }

    pub fn webhook_secret(&self) -> Option<&Secret<String>> {
        self.webhook_secret.as_ref().filter(|k| !k.expose_secret().is_empty())
    }

    pub fn validate(&self, production: bool) -> Result<(), ValidationError> {
        if !self.base_url.starts_with("http://") && !self.base_url.starts_with("https://") {
            return Err(ValidationError::InvalidGatewayUrl);
        }
        if self.send_timeout_secs == 0 || self.send_timeout_secs > MAX_SEND_TIMEOUT_SECS {
            return Err(ValidationError::InvalidSendTimeout);
        }
        if production && self.api_key().is_none() {
            return Err(ValidationError::MissingRequired("GATEWAY__API_KEY"));
        }
        Ok(())
    }
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            instance: default_instance(),
            api_key: None,
            send_timeout_secs: default_send_timeout(),
            webhook_secret: None,
        }
    }
}

fn default_base_url() -> String {
    "http://localhost:8081".to_string()
}

fn default_instance() -> String {
    "default".to_string()
}

fn default_send_timeout() -> u64 {
    MAX_SEND_TIMEOUT_SECS
}
