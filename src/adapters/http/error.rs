//! Error responses for the HTTP surface.
//!
//! Every error body is `{ "code": "...", "message": "..." }`; the code is the
//! domain `ErrorCode` and the status follows from it.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::error;

use crate::domain::foundation::ErrorCode;
use crate::domain::profile::ProfileError;
use crate::domain::session::SessionError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub code: String,
    pub message: String,
}

impl ErrorResponse {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new("BAD_REQUEST", message)
    }
}

pub fn status_for(code: ErrorCode) -> StatusCode {
    match code {
        ErrorCode::ValidationFailed => StatusCode::BAD_REQUEST,
        ErrorCode::SessionNotFound
        | ErrorCode::ProfileNotFound
        | ErrorCode::FieldNotFound
        | ErrorCode::MenuOptionNotFound => StatusCode::NOT_FOUND,
        ErrorCode::InvalidStateTransition
        | ErrorCode::SessionAlreadyActive
        | ErrorCode::SessionTerminal
        | ErrorCode::DuplicateChannel
        | ErrorCode::ConcurrentModification => StatusCode::CONFLICT,
        ErrorCode::ProfileInactive => StatusCode::UNPROCESSABLE_ENTITY,
        ErrorCode::DecisionFailed | ErrorCode::DispatchFailed => StatusCode::BAD_GATEWAY,
        ErrorCode::DatabaseError | ErrorCode::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Handler error: anything that can become an error response.
#[derive(Debug)]
pub enum ApiError {
    Session(SessionError),
    Profile(ProfileError),
    BadRequest(String),
    InvalidSignature(String),
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        ApiError::BadRequest(message.into())
    }

    fn parts(&self) -> (StatusCode, ErrorResponse) {
        match self {
            ApiError::Session(err) => {
                let code = err.code();
                (status_for(code), ErrorResponse::new(code.to_string(), err.message()))
            }
            ApiError::Profile(err) => {
                let code = err.code();
                (status_for(code), ErrorResponse::new(code.to_string(), err.to_string()))
            }
            ApiError::BadRequest(message) => (StatusCode::BAD_REQUEST, ErrorResponse::bad_request(message)),
            ApiError::InvalidSignature(message) => (
                StatusCode::UNAUTHORIZED,
                ErrorResponse::new("INVALID_SIGNATURE", message),
            ),
        }
    }
}

impl From<SessionError> for ApiError {
    fn from(err: SessionError) -> Self {
        ApiError::Session(err)
    }
}

impl From<ProfileError> for ApiError {
    fn from(err: ProfileError) -> Self {
        ApiError::Profile(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = self.parts();
        if status.is_server_error() {
            error!(code = %body.code, message = %body.message, "Request failed");
        }
        (status, Json(body)).into_response()
    }
}

/// Parses a path id, answering 400 on garbage.
pub fn parse_id<T: std::str::FromStr>(raw: &str, what: &str) -> Result<T, ApiError> {
    raw.parse()
        .map_err(|_| ApiError::bad_request(format!("Invalid {} ID", what)))
}
