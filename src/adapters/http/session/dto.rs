//! HTTP DTOs for session and automation endpoints.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{SessionStatus, Timestamp};
use crate::domain::session::{LogEntry, Session, SessionOutcome};

// ════════════════════════════════════════════════════════════════════════════
// Request DTOs
// ════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Deserialize)]
pub struct CreateSessionRequest {
    pub profile_id: String,
    pub request_text: String,
    #[serde(default)]
    pub objective: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListSessionsParams {
    #[serde(default)]
    pub profile_id: Option<String>,
    #[serde(default)]
    pub status: Option<SessionStatus>,
    #[serde(default)]
    pub limit: Option<u32>,
}

/// Free-form operator text for the intent detector.
#[derive(Debug, Clone, Deserialize)]
pub struct AutomationRequest {
    pub text: String,
}

// ════════════════════════════════════════════════════════════════════════════
// Response DTOs
// ════════════════════════════════════════════════════════════════════════════

/// Full session view, transcript included.
#[derive(Debug, Clone, Serialize)]
pub struct SessionResponse {
    pub id: String,
    pub profile_id: String,
    pub requester: String,
    pub objective: String,
    pub request_text: String,
    pub status: SessionStatus,
    pub messages_sent: u32,
    pub messages_received: u32,
    pub deadline: Timestamp,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outcome: Option<SessionOutcome>,
    pub log: Vec<LogEntry>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl From<&Session> for SessionResponse {
    fn from(session: &Session) -> Self {
        Self {
            id: session.id().to_string(),
            profile_id: session.profile_id().to_string(),
            requester: session.requester().to_string(),
            objective: session.objective().to_string(),
            request_text: session.request_text().to_string(),
            status: session.status(),
            messages_sent: session.messages_sent(),
            messages_received: session.messages_received(),
            deadline: *session.deadline(),
            outcome: session.outcome().cloned(),
            log: session.log().to_vec(),
            created_at: *session.created_at(),
            updated_at: *session.updated_at(),
        }
    }
}

/// Listing row, without the transcript.
#[derive(Debug, Clone, Serialize)]
pub struct SessionSummaryResponse {
    pub id: String,
    pub profile_id: String,
    pub objective: String,
    pub status: SessionStatus,
    pub messages_sent: u32,
    pub messages_received: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl From<&Session> for SessionSummaryResponse {
    fn from(session: &Session) -> Self {
        Self {
            id: session.id().to_string(),
            profile_id: session.profile_id().to_string(),
            objective: session.objective().to_string(),
            status: session.status(),
            messages_sent: session.messages_sent(),
            messages_received: session.messages_received(),
            summary: session.outcome().map(|o| o.summary.clone()),
            created_at: *session.created_at(),
            updated_at: *session.updated_at(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SessionListResponse {
    pub sessions: Vec<SessionSummaryResponse>,
    pub total: usize,
}

impl From<Vec<Session>> for SessionListResponse {
    fn from(sessions: Vec<Session>) -> Self {
        let sessions: Vec<SessionSummaryResponse> = sessions.iter().map(SessionSummaryResponse::from).collect();
        Self {
            total: sessions.len(),
            sessions,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct AutomationResponse {
    /// `not_automation`, `no_matching_profile` or `started`.
    pub outcome: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session: Option<SessionResponse>,
}
