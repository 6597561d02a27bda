//! StartSessionHandler - Creates a session and sends its opening message.

use std::sync::Arc;

use crate::application::navigation::{CreateSessionCommand, NavigationEngine, SessionManager};
use crate::domain::foundation::CommandMetadata;
use crate::domain::session::{Session, SessionError};

/// Handler for operator-initiated sessions.
pub struct StartSessionHandler {
    manager: Arc<SessionManager>,
    engine: Arc<NavigationEngine>,
}

impl StartSessionHandler {
    pub fn new(manager: Arc<SessionManager>, engine: Arc<NavigationEngine>) -> Self {
        Self { manager, engine }
    }

    /// Creation errors are returned; a failed opening leaves the session
    /// `failed` with its reason and is returned as `Ok`.
    pub async fn handle(&self, cmd: CreateSessionCommand, metadata: CommandMetadata) -> Result<Session, SessionError> {
        let session = self.manager.create_session(cmd, &metadata).await?;
        self.engine.spawn_initiate(*session.id()).await
    }
}
