//! Inbound message webhook.
//!
//! The messaging gateway posts every received message here. Messages we
//! sent ourselves (`from_me`) are echoed back by some gateways and are
//! dropped. When a webhook secret is configured the raw body must carry a
//! valid `x-gateway-signature`.
//!
//! Each turn runs on its own task, so a request timeout or a dropped
//! connection answers the gateway early but never cuts a turn short.

use std::sync::Arc;

use axum::{body::Bytes, extract::State, http::HeaderMap, routing::post, Json, Router};
use secrecy::{ExposeSecret, Secret};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::adapters::gateway::verify_signature;
use crate::adapters::http::error::ApiError;
use crate::application::navigation::NavigationEngine;
use crate::domain::profile::ChannelAddress;

pub const SIGNATURE_HEADER: &str = "x-gateway-signature";

#[derive(Debug, Clone, Deserialize)]
pub struct InboundMessage {
    pub from: String,
    pub text: String,
    #[serde(default)]
    pub from_me: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct WebhookResponse {
    pub handled: bool,
}

#[derive(Clone)]
pub struct WebhookState {
    engine: Arc<NavigationEngine>,
    secret: Option<Arc<Secret<String>>>,
}

impl WebhookState {
    pub fn new(engine: Arc<NavigationEngine>, secret: Option<Secret<String>>) -> Self {
        Self {
            engine,
            secret: secret.map(Arc::new),
        }
    }
}

/// POST /webhooks/messages
pub async fn receive_message(
    State(state): State<WebhookState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<WebhookResponse>, ApiError> {
    if let Some(secret) = &state.secret {
        let signature = headers.get(SIGNATURE_HEADER).and_then(|v| v.to_str().ok());
        verify_signature(secret.expose_secret().as_bytes(), &body, signature).map_err(|err| {
            warn!(error = %err, "Rejected inbound webhook");
            ApiError::InvalidSignature(err.to_string())
        })?;
    }

    let message: InboundMessage = serde_json::from_slice(&body)
        .map_err(|e| ApiError::bad_request(format!("Invalid payload: {}", e)))?;

    if message.from_me {
        return Ok(Json(WebhookResponse { handled: false }));
    }

    let from = ChannelAddress::parse(&message.from).map_err(|e| ApiError::bad_request(e.to_string()))?;

    debug!(from = %from, "Inbound message");
    let outcome = state.engine.spawn_incoming(from, message.text).await?;
    Ok(Json(WebhookResponse {
        handled: outcome.is_handled(),
    }))
}

/// Webhook endpoints, to be nested under `/webhooks`.
pub fn webhook_routes(state: WebhookState) -> Router {
    Router::new()
        .route("/messages", post(receive_message))
        .with_state(state)
}
