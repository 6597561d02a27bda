//! HTTP middleware and extractors.

mod operator;

pub use operator::{Operator, OperatorRejection, OPERATOR_HEADER, REQUEST_ID_HEADER, TENANT_HEADER};
