//! Session repository port.
//!
//! The session store is the only shared mutable resource in the engine, so
//! this port carries the two atomic operations the lifecycle depends on:
//! exclusive creation per profile and versioned updates.

use async_trait::async_trait;

use crate::domain::foundation::{DomainError, ProfileId, SessionId, SessionStatus, TenantId, Timestamp};
use crate::domain::session::Session;

/// Filter for session listings. Unset criteria match everything.
#[derive(Debug, Clone, Default)]
pub struct SessionFilter {
    pub tenant_id: Option<TenantId>,
    pub profile_id: Option<ProfileId>,
    pub status: Option<SessionStatus>,
    pub limit: Option<u32>,
}

impl SessionFilter {
    pub fn for_tenant(tenant_id: TenantId) -> Self {
        Self {
            tenant_id: Some(tenant_id),
            ..Self::default()
        }
    }

    /// True if `session` satisfies every set criterion (limit aside).
    pub fn matches(&self, session: &Session) -> bool {
        self.tenant_id.as_ref().map_or(true, |t| session.tenant_id() == t)
            && self.profile_id.as_ref().map_or(true, |p| session.profile_id() == p)
            && self.status.map_or(true, |s| session.status() == s)
    }
}

/// Repository port for Session aggregate persistence.
#[async_trait]
pub trait SessionRepository: Send + Sync {
    /// Insert a session unless its profile already has a non-terminal one.
    ///
    /// The check and the insert are one atomic step.
    ///
    /// # Errors
    ///
    /// - `SessionAlreadyActive` (detail `profile_id`) if an active session exists
    /// - `DatabaseError` on persistence failure
    async fn create_exclusive(&self, session: &Session) -> Result<(), DomainError>;

    /// Persist a mutated session.
    ///
    /// Succeeds only if the stored version equals `session.version() - 1`.
    ///
    /// # Errors
    ///
    /// - `SessionNotFound` if the session doesn't exist
    /// - `ConcurrentModification` (detail `session_id`) on a version mismatch
    /// - `DatabaseError` on persistence failure
    async fn update(&self, session: &Session) -> Result<(), DomainError>;

    async fn find_by_id(&self, id: &SessionId) -> Result<Option<Session>, DomainError>;

    /// The non-terminal session for a profile, if any.
    async fn find_active_by_profile(&self, profile_id: &ProfileId) -> Result<Option<Session>, DomainError>;

    /// Sessions matching `filter`, newest first.
    async fn list(&self, filter: &SessionFilter) -> Result<Vec<Session>, DomainError>;

    /// Non-terminal sessions whose deadline is before `now`.
    async fn find_expired(&self, now: &Timestamp) -> Result<Vec<Session>, DomainError>;

    /// Remove every session of a profile. Returns how many were removed.
    async fn delete_by_profile(&self, profile_id: &ProfileId) -> Result<u64, DomainError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_repository_is_object_safe() {
        fn _accepts_dyn(_repo: &dyn SessionRepository) {}
    }
}
