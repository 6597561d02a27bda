//! Session navigation services.
//!
//! - `SessionManager` - lifecycle, exclusive creation, versioned mutations
//! - `NavigationEngine` - opening message and per-message turns
//! - `ExpirySweeper` - periodic timeout of overdue sessions
//! - `IntentDetector` - free-form operator text to a started session
//! - `KeyedLocks` - per-profile serialization

mod engine;
mod expiry_sweeper;
mod intent_detector;
mod keyed_locks;
mod session_manager;

pub use engine::{IncomingOutcome, NavigationEngine, NavigationSettings};
pub use expiry_sweeper::ExpirySweeper;
pub use intent_detector::{IntentDetector, IntentOutcome};
pub use keyed_locks::{KeyGuard, KeyedLocks};
pub use session_manager::{CreateSessionCommand, SessionManager};
