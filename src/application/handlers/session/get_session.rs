//! GetSessionHandler - Query handler for one session with its transcript.

use std::sync::Arc;

use crate::domain::foundation::{SessionId, TenantId};
use crate::domain::session::{Session, SessionError};
use crate::ports::SessionRepository;

#[derive(Debug, Clone)]
pub struct GetSessionQuery {
    pub session_id: SessionId,
    pub tenant_id: TenantId,
}

pub struct GetSessionHandler {
    repository: Arc<dyn SessionRepository>,
}

impl GetSessionHandler {
    pub fn new(repository: Arc<dyn SessionRepository>) -> Self {
        Self { repository }
    }

    pub async fn handle(&self, query: GetSessionQuery) -> Result<Session, SessionError> {
        self.repository
            .find_by_id(&query.session_id)
            .await?
            .filter(|s| s.tenant_id() == &query.tenant_id)
            .ok_or_else(|| SessionError::not_found(query.session_id))
    }
}
