//! Inbound webhook signature verification.
//!
//! The gateway signs each webhook body with HMAC-SHA256 over the raw bytes
//! and sends the hex digest in `x-gateway-signature`.

use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;
use thiserror::Error;

type HmacSha256 = Hmac<Sha256>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SignatureError {
    #[error("missing signature")]
    Missing,

    #[error("signature is not valid hex")]
    Malformed,

    #[error("signature mismatch")]
    Mismatch,

    #[error("invalid signing key")]
    InvalidKey,
}

fn compute(secret: &[u8], payload: &[u8]) -> Result<Vec<u8>, SignatureError> {
    let mut mac = HmacSha256::new_from_slice(secret).map_err(|_| SignatureError::InvalidKey)?;
    mac.update(payload);
    Ok(mac.finalize().into_bytes().to_vec())
}

/// Hex-encoded HMAC-SHA256 of `payload`.
pub fn sign(secret: &[u8], payload: &[u8]) -> Result<String, SignatureError> {
    compute(secret, payload).map(hex::encode)
}

/// Checks `signature` (hex, optionally `sha256=`-prefixed) in constant time.
pub fn verify_signature(secret: &[u8], payload: &[u8], signature: Option<&str>) -> Result<(), SignatureError> {
    let signature = signature.map(str::trim).filter(|s| !s.is_empty()).ok_or(SignatureError::Missing)?;
    let signature = signature.strip_prefix("sha256=").unwrap_or(signature);
    let provided = hex::decode(signature).map_err(|_| SignatureError::Malformed)?;
    let expected = compute(secret, payload)?;

    if expected.len() == provided.len() && bool::from(expected.ct_eq(&provided)) {
        Ok(())
    } else {
        Err(SignatureError::Mismatch)
    }
}
