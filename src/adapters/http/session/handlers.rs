//! HTTP handlers for session and automation endpoints.

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};

use super::dto::{
    AutomationRequest, AutomationResponse, CreateSessionRequest, ListSessionsParams, SessionListResponse,
    SessionResponse,
};
use crate::adapters::http::error::{parse_id, ApiError};
use crate::adapters::http::middleware::Operator;
use crate::application::handlers::session::{
    CancelSessionCommand, CancelSessionHandler, GetSessionHandler, GetSessionQuery, ListSessionsHandler,
    ListSessionsQuery, StartSessionHandler,
};
use crate::application::navigation::{CreateSessionCommand, IntentDetector, IntentOutcome};
use crate::domain::foundation::{ProfileId, SessionId};

// ════════════════════════════════════════════════════════════════════════════
// Handler state
// ════════════════════════════════════════════════════════════════════════════

#[derive(Clone)]
pub struct SessionHandlers {
    start_handler: Arc<StartSessionHandler>,
    cancel_handler: Arc<CancelSessionHandler>,
    get_handler: Arc<GetSessionHandler>,
    list_handler: Arc<ListSessionsHandler>,
    intent_detector: Arc<IntentDetector>,
}

impl SessionHandlers {
    pub fn new(
        start_handler: Arc<StartSessionHandler>,
        cancel_handler: Arc<CancelSessionHandler>,
        get_handler: Arc<GetSessionHandler>,
        list_handler: Arc<ListSessionsHandler>,
        intent_detector: Arc<IntentDetector>,
    ) -> Self {
        Self {
            start_handler,
            cancel_handler,
            get_handler,
            list_handler,
            intent_detector,
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// HTTP handlers
// ════════════════════════════════════════════════════════════════════════════

/// POST /api/sessions - Start a session against a profile
pub async fn create_session(
    State(handlers): State<SessionHandlers>,
    Operator(metadata): Operator,
    Json(req): Json<CreateSessionRequest>,
) -> Result<Response, ApiError> {
    let cmd = CreateSessionCommand {
        profile_id: parse_id::<ProfileId>(&req.profile_id, "profile")?,
        request_text: req.request_text,
        objective: req.objective,
    };

    let session = handlers.start_handler.handle(cmd, metadata).await?;
    Ok((StatusCode::CREATED, Json(SessionResponse::from(&session))).into_response())
}

/// GET /api/sessions - List the tenant's sessions
pub async fn list_sessions(
    State(handlers): State<SessionHandlers>,
    Operator(metadata): Operator,
    Query(params): Query<ListSessionsParams>,
) -> Result<Json<SessionListResponse>, ApiError> {
    let profile_id = params
        .profile_id
        .as_deref()
        .map(|raw| parse_id::<ProfileId>(raw, "profile"))
        .transpose()?;

    let query = ListSessionsQuery {
        tenant_id: metadata.tenant_id,
        profile_id,
        status: params.status,
        limit: params.limit,
    };

    let sessions = handlers.list_handler.handle(query).await?;
    Ok(Json(sessions.into()))
}

/// GET /api/sessions/:id - Session with transcript
pub async fn get_session(
    State(handlers): State<SessionHandlers>,
    Operator(metadata): Operator,
    Path(session_id): Path<String>,
) -> Result<Json<SessionResponse>, ApiError> {
    let query = GetSessionQuery {
        session_id: parse_id::<SessionId>(&session_id, "session")?,
        tenant_id: metadata.tenant_id,
    };

    let session = handlers.get_handler.handle(query).await?;
    Ok(Json(SessionResponse::from(&session)))
}

/// POST /api/sessions/:id/cancel - Stop a running session
pub async fn cancel_session(
    State(handlers): State<SessionHandlers>,
    Operator(metadata): Operator,
    Path(session_id): Path<String>,
) -> Result<Json<SessionResponse>, ApiError> {
    let cmd = CancelSessionCommand {
        session_id: parse_id::<SessionId>(&session_id, "session")?,
    };

    let session = handlers.cancel_handler.handle(cmd, metadata).await?;
    Ok(Json(SessionResponse::from(&session)))
}

/// POST /api/automation/requests - Free-form automation request
pub async fn request_automation(
    State(handlers): State<SessionHandlers>,
    Operator(metadata): Operator,
    Json(req): Json<AutomationRequest>,
) -> Result<Response, ApiError> {
    if req.text.trim().is_empty() {
        return Err(ApiError::bad_request("text must not be empty"));
    }

    let metadata = metadata.with_source("intent_detector");
    let response = match handlers.intent_detector.handle(&req.text, &metadata).await? {
        IntentOutcome::NotAutomation => AutomationResponse {
            outcome: "not_automation",
            session: None,
        },
        IntentOutcome::NoMatchingProfile => AutomationResponse {
            outcome: "no_matching_profile",
            session: None,
        },
        IntentOutcome::Started(session) => {
            return Ok((
                StatusCode::CREATED,
                Json(AutomationResponse {
                    outcome: "started",
                    session: Some(SessionResponse::from(session.as_ref())),
                }),
            )
                .into_response())
        }
    };
    Ok((StatusCode::OK, Json(response)).into_response())
}
