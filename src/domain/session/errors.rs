//! Session-specific error types.

use crate::domain::foundation::{DomainError, ErrorCode, ProfileId, SessionId, ValidationError};

/// Session-specific errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    /// Session was not found.
    NotFound(SessionId),
    /// The target profile does not exist.
    ProfileNotFound(ProfileId),
    /// The target profile is deactivated.
    ProfileInactive(ProfileId),
    /// The profile already has a non-terminal session.
    SessionAlreadyActive(ProfileId),
    /// The session already reached `completed` or `failed`.
    AlreadyTerminal(SessionId),
    /// Another writer changed the session first.
    ConcurrentModification(SessionId),
    /// Invalid state for operation.
    InvalidState(String),
    /// Validation failed.
    ValidationFailed { field: String, message: String },
    /// Infrastructure error.
    Infrastructure(String),
}

impl SessionError {
    pub fn not_found(id: SessionId) -> Self {
        SessionError::NotFound(id)
    }
    pub fn invalid_state(message: impl Into<String>) -> Self {
        SessionError::InvalidState(message.into())
    }
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        SessionError::ValidationFailed {
            field: field.into(),
            message: message.into(),
        }
    }
    pub fn infrastructure(message: impl Into<String>) -> Self {
        SessionError::Infrastructure(message.into())
    }
    pub fn code(&self) -> ErrorCode {
        match self {
            SessionError::NotFound(_) => ErrorCode::SessionNotFound,
            SessionError::ProfileNotFound(_) => ErrorCode::ProfileNotFound,
            SessionError::ProfileInactive(_) => ErrorCode::ProfileInactive,
            SessionError::SessionAlreadyActive(_) => ErrorCode::SessionAlreadyActive,
            SessionError::AlreadyTerminal(_) => ErrorCode::SessionTerminal,
            SessionError::ConcurrentModification(_) => ErrorCode::ConcurrentModification,
            SessionError::InvalidState(_) => ErrorCode::InvalidStateTransition,
            SessionError::ValidationFailed { .. } => ErrorCode::ValidationFailed,
            SessionError::Infrastructure(_) => ErrorCode::DatabaseError,
        }
    }
    pub fn message(&self) -> String {
        match self {
            SessionError::NotFound(id) => format!("Session not found: {}", id),
            SessionError::ProfileNotFound(id) => format!("Profile not found: {}", id),
            SessionError::ProfileInactive(id) => format!("Profile is inactive: {}", id),
            SessionError::SessionAlreadyActive(id) => {
                format!("Profile {} already has an active session", id)
            }
            SessionError::AlreadyTerminal(id) => format!("Session {} has already ended", id),
            SessionError::ConcurrentModification(id) => {
                format!("Session {} was modified concurrently", id)
            }
            SessionError::InvalidState(msg) => format!("Invalid state: {}", msg),
            SessionError::ValidationFailed { field, message } => {
                format!("Validation failed for '{}': {}", field, message)
            }
            SessionError::Infrastructure(msg) => format!("Error: {}", msg),
        }
    }
}

impl std::fmt::Display for SessionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message())
    }
}

impl std::error::Error for SessionError {}

impl From<ValidationError> for SessionError {
    fn from(err: ValidationError) -> Self {
        SessionError::validation(err.field().to_string(), err.to_string())
    }
}

impl From<DomainError> for SessionError {
    fn from(err: DomainError) -> Self {
        let session_id = err.details.get("session_id").and_then(|v| v.parse().ok());
        let profile_id = err.details.get("profile_id").and_then(|v| v.parse().ok());
        match (err.code, session_id, profile_id) {
            (ErrorCode::SessionNotFound, Some(id), _) => SessionError::NotFound(id),
            (ErrorCode::ConcurrentModification, Some(id), _) => {
                SessionError::ConcurrentModification(id)
            }
            (ErrorCode::SessionAlreadyActive, _, Some(id)) => SessionError::SessionAlreadyActive(id),
            (ErrorCode::ProfileNotFound, _, Some(id)) => SessionError::ProfileNotFound(id),
            (ErrorCode::InvalidStateTransition, _, _) => SessionError::InvalidState(err.message),
            (ErrorCode::ValidationFailed, _, _) => SessionError::ValidationFailed {
                field: err
                    .details
                    .get("field")
                    .cloned()
                    .unwrap_or_else(|| "unknown".to_string()),
                message: err.message,
            },
            _ => SessionError::Infrastructure(err.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn already_active_maps_to_code() {
        let err = SessionError::SessionAlreadyActive(ProfileId::new());
        assert_eq!(err.code(), ErrorCode::SessionAlreadyActive);
        assert!(err.to_string().contains("already has an active session"));
    }

    #[test]
    fn transition_domain_error_maps_to_invalid_state() {
        let err = DomainError::new(ErrorCode::InvalidStateTransition, "bad edge");
        assert_eq!(
            SessionError::from(err),
            SessionError::InvalidState("bad edge".to_string())
        );
    }

    #[test]
    fn already_active_domain_error_keeps_profile_id() {
        let profile_id = ProfileId::new();
        let err = DomainError::new(ErrorCode::SessionAlreadyActive, "busy")
            .with_detail("profile_id", profile_id.to_string());
        assert_eq!(
            SessionError::from(err),
            SessionError::SessionAlreadyActive(profile_id)
        );
    }

    #[test]
    fn concurrent_modification_keeps_session_id() {
        let session_id = SessionId::new();
        let err = DomainError::new(ErrorCode::ConcurrentModification, "stale")
            .with_detail("session_id", session_id.to_string());
        assert_eq!(
            SessionError::from(err),
            SessionError::ConcurrentModification(session_id)
        );
    }

    #[test]
    fn database_error_maps_to_infrastructure() {
        let err = DomainError::database("pool timed out");
        assert!(matches!(SessionError::from(err), SessionError::Infrastructure(_)));
    }
}
