//! Command infrastructure for application handlers.
//!
//! `CommandMetadata` carries who asked for a command and how to correlate
//! it in logs, so handlers take one struct instead of a loose parameter list.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{OperatorId, TenantId};

/// Metadata context for command handlers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandMetadata {
    /// Tenant the command is scoped to.
    pub tenant_id: TenantId,

    /// The operator executing this command.
    pub operator_id: OperatorId,

    /// Links related operations across a single request.
    #[serde(skip_serializing_if = "Option::is_none")]
    correlation_id: Option<String>,

    /// Source of this command (e.g., "api", "intent_detector", "webhook").
    #[serde(skip_serializing_if = "Option::is_none")]
    source: Option<String>,
}

impl CommandMetadata {
    /// Creates new command metadata.
    pub fn new(tenant_id: TenantId, operator_id: OperatorId) -> Self {
        Self {
            tenant_id,
            operator_id,
            correlation_id: None,
            source: None,
        }
    }

    /// Builder: Add correlation ID for request tracing.
    pub fn with_correlation_id(mut self, id: impl Into<String>) -> Self {
        self.correlation_id = Some(id.into());
        self
    }

    /// Builder: Add source identifier.
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Returns the correlation ID, generating one if not set.
    pub fn correlation_id(&self) -> String {
        self.correlation_id
            .clone()
            .unwrap_or_else(|| Uuid::new_v4().to_string())
    }

    /// Returns the source if set.
    pub fn source(&self) -> Option<&str> {
        self.source.as_deref()
    }
}

#[cfg(test)]
impl CommandMetadata {
    /// Creates a test fixture with a test tenant and operator.
    pub fn test_fixture() -> Self {
        Self::new(
            TenantId::new("tenant-test").unwrap(),
            OperatorId::new("operator-test").unwrap(),
        )
        .with_correlation_id("test-correlation-id")
        .with_source("test")
    }
}
