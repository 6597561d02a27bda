//! Application handlers.
//!
//! Command and query handlers behind the operator surface.

pub mod profile;
pub mod session;

pub use profile::*;
pub use session::*;
