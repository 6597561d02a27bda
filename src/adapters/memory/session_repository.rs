//! In-memory session repository.
//!
//! Backs development wiring and tests. The exclusive-create check and the
//! insert run under one write lock, which is what keeps a profile at one
//! active session.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::domain::foundation::{DomainError, ErrorCode, ProfileId, SessionId, Timestamp};
use crate::domain::session::Session;
use crate::ports::{SessionFilter, SessionRepository};

#[derive(Debug, Clone, Default)]
pub struct InMemorySessionRepository {
    sessions: Arc<RwLock<HashMap<SessionId, Session>>>,
}

impl InMemorySessionRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored sessions (useful for tests).
    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }

    /// Insert without the exclusivity check, for seeding tests.
    pub async fn insert(&self, session: Session) {
        self.sessions.write().await.insert(*session.id(), session);
    }
}

#[async_trait]
impl SessionRepository for InMemorySessionRepository {
    async fn create_exclusive(&self, session: &Session) -> Result<(), DomainError> {
        let mut sessions = self.sessions.write().await;
        let busy = sessions
            .values()
            .any(|s| s.profile_id() == session.profile_id() && !s.is_terminal());
        if busy {
            return Err(DomainError::new(
                ErrorCode::SessionAlreadyActive,
                "Profile already has an active session",
            )
            .with_detail("profile_id", session.profile_id().to_string()));
        }
        sessions.insert(*session.id(), session.clone());
        Ok(())
    }

    async fn update(&self, session: &Session) -> Result<(), DomainError> {
        let mut sessions = self.sessions.write().await;
        let stored = sessions.get(session.id()).ok_or_else(|| {
            DomainError::new(ErrorCode::SessionNotFound, "Session not found")
                .with_detail("session_id", session.id().to_string())
        })?;
        if stored.version() + 1 != session.version() {
            return Err(DomainError::new(
                ErrorCode::ConcurrentModification,
                format!(
                    "stored version {} does not precede {}",
                    stored.version(),
                    session.version()
                ),
            )
            .with_detail("session_id", session.id().to_string()));
        }
        sessions.insert(*session.id(), session.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: &SessionId) -> Result<Option<Session>, DomainError> {
        Ok(self.sessions.read().await.get(id).cloned())
    }

    async fn find_active_by_profile(&self, profile_id: &ProfileId) -> Result<Option<Session>, DomainError> {
        Ok(self
            .sessions
            .read()
            .await
            .values()
            .find(|s| s.profile_id() == profile_id && !s.is_terminal())
            .cloned())
    }

    async fn list(&self, filter: &SessionFilter) -> Result<Vec<Session>, DomainError> {
        let sessions = self.sessions.read().await;
        let mut found: Vec<Session> = sessions.values().filter(|s| filter.matches(s)).cloned().collect();
        found.sort_by(|a, b| b.created_at().cmp(a.created_at()));
        if let Some(limit) = filter.limit {
            found.truncate(limit as usize);
        }
        Ok(found)
    }

    async fn find_expired(&self, now: &Timestamp) -> Result<Vec<Session>, DomainError> {
        Ok(self
            .sessions
            .read()
            .await
            .values()
            .filter(|s| !s.is_terminal() && s.is_expired_at(now))
            .cloned()
            .collect())
    }

    async fn delete_by_profile(&self, profile_id: &ProfileId) -> Result<u64, DomainError> {
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, s| s.profile_id() != profile_id);
        Ok((before - sessions.len()) as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::session::fixtures::{new_session, pending_session};
    use crate::domain::session::FailureReason;

    #[tokio::test]
    async fn create_exclusive_rejects_second_active_session() {
        let repo = InMemorySessionRepository::new();
        let first = pending_session();
        repo.create_exclusive(&first).await.unwrap();

        let second = Session::new(new_session(*first.profile_id(), Timestamp::now().plus_secs(60))).unwrap();
        let err = repo.create_exclusive(&second).await.unwrap_err();

        assert_eq!(err.code, ErrorCode::SessionAlreadyActive);
        assert_eq!(repo.len().await, 1);
    }

    #[tokio::test]
    async fn create_exclusive_allows_new_session_after_terminal() {
        let repo = InMemorySessionRepository::new();
        let mut first = pending_session();
        repo.create_exclusive(&first).await.unwrap();
        first.fail(FailureReason::timeout()).unwrap();
        repo.update(&first).await.unwrap();

        let second = Session::new(new_session(*first.profile_id(), Timestamp::now().plus_secs(60))).unwrap();
        repo.create_exclusive(&second).await.unwrap();
        assert_eq!(repo.len().await, 2);
    }

    #[tokio::test]
    async fn update_rejects_stale_version() {
        let repo = InMemorySessionRepository::new();
        let session = pending_session();
        repo.create_exclusive(&session).await.unwrap();

        let mut a = session.clone();
        let mut b = session.clone();
        a.append_our_message("first").unwrap();
        b.append_our_message("second").unwrap();

        repo.update(&a).await.unwrap();
        let err = repo.update(&b).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::ConcurrentModification);

        let stored = repo.find_by_id(session.id()).await.unwrap().unwrap();
        assert_eq!(stored.log()[0].text, "first");
    }

    #[tokio::test]
    async fn find_expired_skips_terminal_and_future_sessions() {
        let repo = InMemorySessionRepository::new();
        let expired =
            Session::new(new_session(ProfileId::new(), Timestamp::now().minus_secs(1))).unwrap();
        let mut ended =
            Session::new(new_session(ProfileId::new(), Timestamp::now().minus_secs(1))).unwrap();
        ended.fail(FailureReason::cancelled()).unwrap();
        repo.insert(expired.clone()).await;
        repo.insert(ended).await;
        repo.insert(pending_session()).await;

        let found = repo.find_expired(&Timestamp::now()).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id(), expired.id());
    }

    #[tokio::test]
    async fn list_applies_filter_and_limit() {
        let repo = InMemorySessionRepository::new();
        let first = pending_session();
        repo.insert(first.clone()).await;
        repo.insert(pending_session()).await;

        let by_profile = SessionFilter {
            profile_id: Some(*first.profile_id()),
            ..SessionFilter::default()
        };
        assert_eq!(repo.list(&by_profile).await.unwrap().len(), 1);

        let limited = SessionFilter {
            limit: Some(1),
            ..SessionFilter::default()
        };
        assert_eq!(repo.list(&limited).await.unwrap().len(), 1);
    }
}
