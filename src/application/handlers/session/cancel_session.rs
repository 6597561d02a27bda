//! CancelSessionHandler - Operator stop of a running session.

use std::sync::Arc;

use crate::application::navigation::SessionManager;
use crate::domain::foundation::{CommandMetadata, SessionId};
use crate::domain::session::{Session, SessionError};

#[derive(Debug, Clone)]
pub struct CancelSessionCommand {
    pub session_id: SessionId,
}

pub struct CancelSessionHandler {
    manager: Arc<SessionManager>,
}

impl CancelSessionHandler {
    pub fn new(manager: Arc<SessionManager>) -> Self {
        Self { manager }
    }

    /// # Errors
    ///
    /// - `NotFound` if the session is missing or belongs to another tenant
    /// - `AlreadyTerminal` if it already ended
    pub async fn handle(&self, cmd: CancelSessionCommand, metadata: CommandMetadata) -> Result<Session, SessionError> {
        let session = self.manager.get(&cmd.session_id).await?;
        if session.tenant_id() != &metadata.tenant_id {
            return Err(SessionError::not_found(cmd.session_id));
        }
        self.manager.cancel(&cmd.session_id).await
    }
}
