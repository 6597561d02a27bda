//! Channel address value object.
//!
//! The messaging gateway reports the same responder under several spellings
//! (`5511999990000@s.whatsapp.net`, `5511999990000@c.us`, `+55 11 99999-0000`).
//! Everything is stored and compared in normalized form.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::foundation::ValidationError;

/// Suffixes appended by the messaging channel to addresses.
const CHANNEL_SUFFIXES: &[&str] = &["@s.whatsapp.net", "@c.us", "@g.us", "@lid"];

/// Normalized address of an external responder on the messaging channel.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ChannelAddress(String);

impl ChannelAddress {
    /// Parses and normalizes a raw channel address.
    ///
    /// # Errors
    ///
    /// - `EmptyField` if nothing remains after normalization
    pub fn parse(raw: &str) -> Result<Self, ValidationError> {
        let normalized = normalize(raw);
        if normalized.is_empty() {
            return Err(ValidationError::empty_field("channel_address"));
        }
        Ok(Self(normalized))
    }

    /// Returns the normalized address.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

fn normalize(raw: &str) -> String {
    let mut address = raw.trim();
    for suffix in CHANNEL_SUFFIXES {
        if let Some(stripped) = address.strip_suffix(suffix) {
            address = stripped;
            break;
        }
    }

    let phone_like = address
        .chars()
        .all(|c| c.is_ascii_digit() || matches!(c, '+' | '-' | '(' | ')' | ' ' | '.'));

    if phone_like {
        address.chars().filter(|c| c.is_ascii_digit()).collect()
    } else {
        address.to_lowercase()
    }
}

impl fmt::Display for ChannelAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<String> for ChannelAddress {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<ChannelAddress> for String {
    fn from(address: ChannelAddress) -> Self {
        address.0
    }
}
