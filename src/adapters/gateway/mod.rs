//! Messaging gateway adapters.

mod http_gateway;
mod recording;
mod signature;

pub use http_gateway::{HttpGatewayConfig, HttpMessageGateway};
pub use recording::{RecordingGateway, SentMessage};
pub use signature::{sign, verify_signature, SignatureError};
