//! HTTP adapter - Operator REST API and gateway webhook.
//!
//! Each area has its own handler state and router; `build_router` nests
//! them and applies tracing, CORS and timeout layers.

pub mod error;
pub mod middleware;
pub mod profile;
pub mod session;
pub mod webhook;

use std::sync::Arc;
use std::time::Duration;

use axum::{http::HeaderValue, routing::get, Json, Router};
use secrecy::Secret;
use tower_http::{
    cors::{Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::application::handlers::profile::{
    AddFieldHandler, AddMenuOptionHandler, CreateProfileHandler, DeleteProfileHandler, GetProfileHandler,
    ListAvailableContactsHandler, ListProfilesHandler, RemoveFieldHandler, RemoveMenuOptionHandler,
    UpdateFieldHandler, UpdateMenuOptionHandler, UpdateProfileHandler,
};
use crate::application::handlers::session::{
    CancelSessionHandler, GetSessionHandler, ListSessionsHandler, StartSessionHandler,
};
use crate::application::navigation::{IntentDetector, NavigationEngine, SessionManager};
use crate::ports::{ContactDirectory, ProfileRepository, SessionRepository};

pub use error::{ApiError, ErrorResponse};
pub use profile::ProfileHandlers;
pub use session::SessionHandlers;
pub use webhook::WebhookState;

/// Everything the HTTP surface talks to.
#[derive(Clone)]
pub struct ApiContext {
    pub profiles: Arc<dyn ProfileRepository>,
    pub sessions: Arc<dyn SessionRepository>,
    pub manager: Arc<SessionManager>,
    pub engine: Arc<NavigationEngine>,
    pub intent_detector: Arc<IntentDetector>,
    pub contacts: Arc<dyn ContactDirectory>,
    /// Applied to new profiles that leave `max_wait_seconds` unset.
    pub default_max_wait_seconds: u32,
    pub webhook_secret: Option<Secret<String>>,
}

/// Layer settings for `build_router`.
#[derive(Debug, Clone)]
pub struct HttpSettings {
    /// Empty allows any origin.
    pub cors_origins: Vec<String>,
    pub request_timeout: Duration,
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            cors_origins: Vec::new(),
            request_timeout: Duration::from_secs(120),
        }
    }
}

impl ApiContext {
    fn profile_handlers(&self) -> ProfileHandlers {
        let repo = || self.profiles.clone();
        ProfileHandlers {
            create: Arc::new(CreateProfileHandler::new(repo(), self.default_max_wait_seconds)),
            update: Arc::new(UpdateProfileHandler::new(repo())),
            delete: Arc::new(DeleteProfileHandler::new(repo(), self.sessions.clone())),
            get: Arc::new(GetProfileHandler::new(repo())),
            list: Arc::new(ListProfilesHandler::new(repo())),
            add_field: Arc::new(AddFieldHandler::new(repo())),
            update_field: Arc::new(UpdateFieldHandler::new(repo())),
            remove_field: Arc::new(RemoveFieldHandler::new(repo())),
            add_menu_option: Arc::new(AddMenuOptionHandler::new(repo())),
            update_menu_option: Arc::new(UpdateMenuOptionHandler::new(repo())),
            remove_menu_option: Arc::new(RemoveMenuOptionHandler::new(repo())),
            available_contacts: Arc::new(ListAvailableContactsHandler::new(self.contacts.clone(), repo())),
        }
    }

    fn session_handlers(&self) -> SessionHandlers {
        SessionHandlers::new(
            Arc::new(StartSessionHandler::new(self.manager.clone(), self.engine.clone())),
            Arc::new(CancelSessionHandler::new(self.manager.clone())),
            Arc::new(GetSessionHandler::new(self.sessions.clone())),
            Arc::new(ListSessionsHandler::new(self.sessions.clone())),
            self.intent_detector.clone(),
        )
    }
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let base = CorsLayer::new().allow_methods(Any).allow_headers(Any);
    if origins.is_empty() {
        return base.allow_origin(Any);
    }
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| HeaderValue::from_str(origin).ok())
        .collect();
    base.allow_origin(origins)
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

/// Assembles the full application router.
pub fn build_router(context: ApiContext, settings: &HttpSettings) -> Router {
    let profiles = context.profile_handlers();
    let sessions = context.session_handlers();
    let webhooks = WebhookState::new(context.engine.clone(), context.webhook_secret.clone());

    Router::new()
        .route("/health", get(health))
        .nest("/api/profiles", profile::profile_routes(profiles.clone()))
        .nest("/api/contacts", profile::contact_routes(profiles))
        .nest("/api/sessions", session::session_routes(sessions.clone()))
        .nest("/api/automation", session::automation_routes(sessions))
        .nest("/webhooks", webhook::webhook_routes(webhooks))
        .layer(TimeoutLayer::new(settings.request_timeout))
        .layer(cors_layer(&settings.cors_origins))
        .layer(TraceLayer::new_for_http())
}
