//! ListSessionsHandler - Query handler for a tenant's sessions.

use std::sync::Arc;

use crate::domain::foundation::{ProfileId, SessionStatus, TenantId};
use crate::domain::session::{Session, SessionError};
use crate::ports::{SessionFilter, SessionRepository};

/// Default and maximum page size.
const DEFAULT_LIMIT: u32 = 50;
const MAX_LIMIT: u32 = 200;

#[derive(Debug, Clone)]
pub struct ListSessionsQuery {
    pub tenant_id: TenantId,
    pub profile_id: Option<ProfileId>,
    pub status: Option<SessionStatus>,
    pub limit: Option<u32>,
}

impl ListSessionsQuery {
    pub fn all(tenant_id: TenantId) -> Self {
        Self {
            tenant_id,
            profile_id: None,
            status: None,
            limit: None,
        }
    }

    fn to_filter(&self) -> SessionFilter {
        SessionFilter {
            tenant_id: Some(self.tenant_id.clone()),
            profile_id: self.profile_id,
            status: self.status,
            limit: Some(self.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT)),
        }
    }
}

pub struct ListSessionsHandler {
    repository: Arc<dyn SessionRepository>,
}

impl ListSessionsHandler {
    pub fn new(repository: Arc<dyn SessionRepository>) -> Self {
        Self { repository }
    }

    pub async fn handle(&self, query: ListSessionsQuery) -> Result<Vec<Session>, SessionError> {
        Ok(self.repository.list(&query.to_filter()).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::InMemorySessionRepository;
    use crate::domain::foundation::Timestamp;
    use crate::domain::session::fixtures::new_session;

    #[tokio::test]
    async fn lists_only_own_tenant() {
        let repo = InMemorySessionRepository::new();
        let mine = Session::new(new_session(ProfileId::new(), Timestamp::now().plus_secs(60))).unwrap();
        let mut theirs = new_session(ProfileId::new(), Timestamp::now().plus_secs(60));
        theirs.tenant_id = TenantId::new("tenant-2").unwrap();
        repo.insert(mine.clone()).await;
        repo.insert(Session::new(theirs).unwrap()).await;

        let handler = ListSessionsHandler::new(Arc::new(repo));
        let found = handler
            .handle(ListSessionsQuery::all(TenantId::new("tenant-1").unwrap()))
            .await
            .unwrap();

        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id(), mine.id());
    }

    #[test]
    fn limit_is_clamped() {
        let query = ListSessionsQuery {
            limit: Some(10_000),
            ..ListSessionsQuery::all(TenantId::new("tenant-1").unwrap())
        };
        assert_eq!(query.to_filter().limit, Some(MAX_LIMIT));
    }
}
