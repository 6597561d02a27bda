//! HTTP routes for session and automation endpoints.

use axum::{
    routing::{get, post},
    Router,
};

use super::handlers::{cancel_session, create_session, get_session, list_sessions, request_automation, SessionHandlers};

/// Session endpoints, to be nested under `/api/sessions`.
pub fn session_routes(handlers: SessionHandlers) -> Router {
    Router::new()
        .route("/", post(create_session).get(list_sessions))
        .route("/:id", get(get_session))
        .route("/:id/cancel", post(cancel_session))
        .with_state(handlers)
}

/// Intent detector entry point, to be nested under `/api/automation`.
pub fn automation_routes(handlers: SessionHandlers) -> Router {
    Router::new()
        .route("/requests", post(request_automation))
        .with_state(handlers)
}
