//! HTTP messaging gateway adapter.
//!
//! Talks to a WhatsApp gateway exposing instance-scoped REST endpoints:
//! `POST {base}/message/sendText/{instance}` to send and
//! `POST {base}/chat/findContacts/{instance}` to enumerate contacts.
//! Every request carries the `apikey` header.
//!
//! # Configuration
//!
//! ```ignore
//! let config = HttpGatewayConfig::new("https://gateway.local", "main", api_key)
//!     .with_timeout(Duration::from_secs(10));
//! let gateway = HttpMessageGateway::new(config)?;
//! ```

use async_trait::async_trait;
use reqwest::{Client, Response};
use secrecy::{ExposeSecret, Secret};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

use crate::domain::profile::ChannelAddress;
use crate::ports::{Contact, ContactDirectory, GatewayError, MessageGateway};

#[derive(Debug, Clone)]
pub struct HttpGatewayConfig {
    pub base_url: String,
    pub instance: String,
    api_key: Secret<String>,
    pub timeout: Duration,
}

impl HttpGatewayConfig {
    pub fn new(base_url: impl Into<String>, instance: impl Into<String>, api_key: Secret<String>) -> Self {
        Self {
            base_url: base_url.into(),
            instance: instance.into(),
            api_key,
            timeout: Duration::from_secs(10),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

pub struct HttpMessageGateway {
    config: HttpGatewayConfig,
    client: Client,
}

impl HttpMessageGateway {
    /// # Errors
    ///
    /// `Network` if the HTTP client cannot be built.
    pub fn new(config: HttpGatewayConfig) -> Result<Self, GatewayError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| GatewayError::Network(format!("failed to build HTTP client: {}", e)))?;
        Ok(Self { config, client })
    }

    fn url(&self, path: &str) -> String {
        format!(
            "{}/{}/{}",
            self.config.base_url.trim_end_matches('/'),
            path,
            self.config.instance
        )
    }

    async fn post<T: Serialize + ?Sized>(&self, path: &str, body: &T) -> Result<Response, GatewayError> {
        let response = self
            .client
            .post(self.url(path))
            .header("apikey", self.config.api_key.expose_secret())
            .json(body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    GatewayError::Timeout(self.config.timeout.as_secs())
                } else {
                    GatewayError::Network(e.to_string())
                }
            })?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let message = response.text().await.unwrap_or_default();
        Err(GatewayError::Rejected {
            status: status.as_u16(),
            message,
        })
    }
}

#[derive(Debug, Serialize)]
struct SendTextBody<'a> {
    number: &'a str,
    text: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GatewayContact {
    remote_jid: String,
    #[serde(default)]
    push_name: Option<String>,
    #[serde(default)]
    is_business: Option<bool>,
}

impl GatewayContact {
    /// Group chats and broadcast lists are not responders.
    fn into_contact(self) -> Option<Contact> {
        if self.remote_jid.ends_with("@g.us") || self.remote_jid.ends_with("@broadcast") {
            return None;
        }
        let address = ChannelAddress::parse(&self.remote_jid).ok()?;
        Some(Contact {
            address,
            display_name: self.push_name.filter(|n| !n.trim().is_empty()),
            is_business: self.is_business.unwrap_or(false),
        })
    }
}

#[async_trait]
impl MessageGateway for HttpMessageGateway {
    async fn send(&self, to: &ChannelAddress, text: &str) -> Result<(), GatewayError> {
        debug!(to = %to, chars = text.chars().count(), "Sending message through gateway");
        self.post(
            "message/sendText",
            &SendTextBody {
                number: to.as_str(),
                text,
            },
        )
        .await?;
        Ok(())
    }
}

#[async_trait]
impl ContactDirectory for HttpMessageGateway {
    async fn list_contacts(&self) -> Result<Vec<Contact>, GatewayError> {
        let response = self.post("chat/findContacts", &serde_json::json!({})).await?;
        let raw: Vec<GatewayContact> = response
            .json()
            .await
            .map_err(|e| GatewayError::Parse(e.to_string()))?;
        Ok(raw.into_iter().filter_map(GatewayContact::into_contact).collect())
    }
}
