//! Configuration error types

use thiserror::Error;

/// Errors that can occur during configuration loading
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration loading failed: {0}")]
    LoadError(#[from] config::ConfigError),

    #[error("Validation failed: {0}")]
    ValidationFailed(#[from] ValidationError),
}

/// Errors that can occur during configuration validation
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Required configuration missing: {0}")]
    MissingRequired(&'static str),

    #[error("Invalid port number")]
    InvalidPort,

    #[error("Invalid request timeout")]
    InvalidTimeout,

    #[error("Invalid database URL format")]
    InvalidDatabaseUrl,

    #[error("Pool min_connections exceeds max_connections")]
    InvalidPoolSize,

    #[error("Pool size exceeds maximum allowed (100)")]
    PoolSizeTooLarge,

    #[error("Invalid gateway URL format")]
    InvalidGatewayUrl,

    #[error("Gateway send timeout must be between 1 and 10 seconds")]
    InvalidSendTimeout,

    #[error("Mock AI provider is not allowed in production")]
    MockProviderInProduction,

    #[error("Message ceiling must be at least 1")]
    InvalidMessageCeiling,

    #[error("Reply delay minimum exceeds maximum")]
    InvalidReplyDelay,

    #[error("Invalid navigation interval: {0}")]
    InvalidInterval(&'static str),
}
