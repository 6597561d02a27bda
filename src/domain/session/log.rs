//! Navigation log entries.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{Timestamp, ValidationError};

/// Who wrote a log entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sender {
    /// The external automated responder.
    Responder,
    /// This engine.
    Us,
}

impl Sender {
    pub fn as_str(&self) -> &'static str {
        match self {
            Sender::Responder => "responder",
            Sender::Us => "us",
        }
    }

    pub fn parse(s: &str) -> Result<Self, ValidationError> {
        match s {
            "responder" => Ok(Sender::Responder),
            "us" => Ok(Sender::Us),
            other => Err(ValidationError::invalid_format(
                "sender",
                format!("unknown sender '{}'", other),
            )),
        }
    }
}

/// One line of a session transcript.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    /// Position in the transcript, 0-based and gap-free.
    pub seq: u32,
    pub sender: Sender,
    pub text: String,
    pub at: Timestamp,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sender_round_trips_storage_names() {
        assert_eq!(Sender::parse(Sender::Responder.as_str()).unwrap(), Sender::Responder);
        assert_eq!(Sender::parse(Sender::Us.as_str()).unwrap(), Sender::Us);
        assert!(Sender::parse("bot").is_err());
    }
}
