//! Session command and query handlers.

mod cancel_session;
mod get_session;
mod list_sessions;
mod start_session;

pub use cancel_session::{CancelSessionCommand, CancelSessionHandler};
pub use get_session::{GetSessionHandler, GetSessionQuery};
pub use list_sessions::{ListSessionsHandler, ListSessionsQuery};
pub use start_session::StartSessionHandler;
