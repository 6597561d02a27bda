//! Application layer - Navigation services, commands, queries and handlers.
//!
//! `navigation` holds the long-lived services that drive sessions;
//! `handlers` holds the per-request command and query handlers.

pub mod handlers;
pub mod navigation;

pub use handlers::*;
pub use navigation::{
    CreateSessionCommand, ExpirySweeper, IncomingOutcome, IntentDetector, IntentOutcome, KeyedLocks,
    NavigationEngine, NavigationSettings, SessionManager,
};
