//! Operator context extractor for axum.
//!
//! Authentication happens upstream; this layer only reads who is calling:
//! `x-tenant-id` and `x-operator-id` are required, `x-request-id` is used
//! as the correlation id when present.
//!
//! ```ignore
//! async fn my_handler(Operator(metadata): Operator) -> impl IntoResponse {
//!     format!("tenant {}", metadata.tenant_id)
//! }
//! ```

use async_trait::async_trait;
use axum::{
    extract::FromRequestParts,
    http::{request::Parts, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};

use crate::domain::foundation::{CommandMetadata, OperatorId, TenantId};

pub const TENANT_HEADER: &str = "x-tenant-id";
pub const OPERATOR_HEADER: &str = "x-operator-id";
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// The calling operator, as command metadata.
#[derive(Debug, Clone)]
pub struct Operator(pub CommandMetadata);

#[async_trait]
impl<S> FromRequestParts<S> for Operator
where
    S: Send + Sync,
{
    type Rejection = OperatorRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        operator_from_headers(&parts.headers).map(Operator)
    }
}

fn header<'a>(headers: &'a HeaderMap, name: &'static str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
}

fn operator_from_headers(headers: &HeaderMap) -> Result<CommandMetadata, OperatorRejection> {
    let tenant = header(headers, TENANT_HEADER).ok_or(OperatorRejection::Missing(TENANT_HEADER))?;
    let operator = header(headers, OPERATOR_HEADER).ok_or(OperatorRejection::Missing(OPERATOR_HEADER))?;

    let tenant_id = TenantId::new(tenant).map_err(|_| OperatorRejection::Invalid(TENANT_HEADER))?;
    let operator_id = OperatorId::new(operator).map_err(|_| OperatorRejection::Invalid(OPERATOR_HEADER))?;

    let mut metadata = CommandMetadata::new(tenant_id, operator_id).with_source("http");
    if let Some(request_id) = header(headers, REQUEST_ID_HEADER) {
        metadata = metadata.with_correlation_id(request_id);
    }
    Ok(metadata)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OperatorRejection {
    Missing(&'static str),
    Invalid(&'static str),
}

impl IntoResponse for OperatorRejection {
    fn into_response(self) -> Response {
        let message = match self {
            OperatorRejection::Missing(name) => format!("Missing {} header", name),
            OperatorRejection::Invalid(name) => format!("Invalid {} header", name),
        };
        (
            StatusCode::UNAUTHORIZED,
            Json(serde_json::json!({
                "code": "UNAUTHENTICATED",
                "message": message,
            })),
        )
            .into_response()
    }
}
