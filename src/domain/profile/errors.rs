//! Profile-specific error types.

use thiserror::Error;

use crate::domain::foundation::{
    DomainError, ErrorCode, FieldId, MenuOptionId, ProfileId, ValidationError,
};

/// Profile-specific errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProfileError {
    #[error("Profile not found: {0}")]
    NotFound(ProfileId),

    #[error("A profile already targets channel address {0}")]
    DuplicateChannel(String),

    #[error("Field not found: {0}")]
    FieldNotFound(FieldId),

    #[error("Menu option not found: {0}")]
    MenuOptionNotFound(MenuOptionId),

    #[error("Validation failed for '{field}': {message}")]
    ValidationFailed { field: String, message: String },

    #[error("Error: {0}")]
    Infrastructure(String),
}

impl ProfileError {
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        ProfileError::ValidationFailed {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn code(&self) -> ErrorCode {
        match self {
            ProfileError::NotFound(_) => ErrorCode::ProfileNotFound,
            ProfileError::DuplicateChannel(_) => ErrorCode::DuplicateChannel,
            ProfileError::FieldNotFound(_) => ErrorCode::FieldNotFound,
            ProfileError::MenuOptionNotFound(_) => ErrorCode::MenuOptionNotFound,
            ProfileError::ValidationFailed { .. } => ErrorCode::ValidationFailed,
            ProfileError::Infrastructure(_) => ErrorCode::DatabaseError,
        }
    }
}

impl From<ValidationError> for ProfileError {
    fn from(err: ValidationError) -> Self {
        ProfileError::validation(err.field().to_string(), err.to_string())
    }
}

impl From<DomainError> for ProfileError {
    fn from(err: DomainError) -> Self {
        match err.code {
            ErrorCode::ProfileNotFound => {
                match err.details.get("profile_id").and_then(|v| v.parse().ok()) {
                    Some(id) => ProfileError::NotFound(id),
                    None => ProfileError::Infrastructure(err.to_string()),
                }
            }
            ErrorCode::DuplicateChannel => {
                ProfileError::DuplicateChannel(err.details.get("channel").cloned().unwrap_or_default())
            }
            ErrorCode::ValidationFailed => ProfileError::ValidationFailed {
                field: err.details.get("field").cloned().unwrap_or_else(|| "unknown".to_string()),
                message: err.message,
            },
            _ => ProfileError::Infrastructure(err.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_error_keeps_field_name() {
        let err: ProfileError = ValidationError::empty_field("name").into();
        assert!(matches!(err, ProfileError::ValidationFailed { ref field, .. } if field == "name"));
        assert_eq!(err.code(), ErrorCode::ValidationFailed);
    }

    #[test]
    fn duplicate_channel_domain_error_maps_to_variant() {
        let err = DomainError::new(ErrorCode::DuplicateChannel, "dup").with_detail("channel", "5511");
        assert_eq!(
            ProfileError::from(err),
            ProfileError::DuplicateChannel("5511".to_string())
        );
    }

    #[test]
    fn database_error_maps_to_infrastructure() {
        let err = DomainError::database("connection reset");
        assert!(matches!(ProfileError::from(err), ProfileError::Infrastructure(_)));
    }
}
