//! Session domain module.
//!
//! A session is a single automated conversation with one responder profile,
//! from the first message we send until the objective is met or abandoned.

mod aggregate;
mod errors;
mod log;
mod outcome;

pub use aggregate::{NewSession, Session, MAX_OBJECTIVE_LENGTH};
pub use errors::SessionError;
pub use log::{LogEntry, Sender};
pub use outcome::{FailureKind, FailureReason, SessionOutcome};

#[cfg(test)]
pub(crate) use aggregate::fixtures;
