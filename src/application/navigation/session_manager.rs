//! SessionManager - Session lifecycle and transcript persistence.
//!
//! Creation goes through the profile lock plus the repository's exclusive
//! insert. Every later mutation is a load, apply, versioned update cycle
//! that reloads and retries when another writer got there first.

use std::sync::Arc;

use tracing::{debug, info};

use super::KeyedLocks;
use crate::domain::foundation::{
    CommandMetadata, DomainError, ErrorCode, ProfileId, SessionId, Timestamp,
};
use crate::domain::session::{FailureReason, NewSession, Session, SessionError};
use crate::ports::{ProfileRepository, SessionRepository};

/// Attempts per mutation before giving up on a contended session.
const MAX_UPDATE_ATTEMPTS: usize = 3;

/// Command to start an automation session.
#[derive(Debug, Clone)]
pub struct CreateSessionCommand {
    pub profile_id: ProfileId,
    /// The operator's request, verbatim.
    pub request_text: String,
    /// Objective handed to the decision source; the request text if unset.
    pub objective: Option<String>,
}

pub struct SessionManager {
    sessions: Arc<dyn SessionRepository>,
    profiles: Arc<dyn ProfileRepository>,
    locks: Arc<KeyedLocks<ProfileId>>,
}

impl SessionManager {
    pub fn new(
        sessions: Arc<dyn SessionRepository>,
        profiles: Arc<dyn ProfileRepository>,
        locks: Arc<KeyedLocks<ProfileId>>,
    ) -> Self {
        Self {
            sessions,
            profiles,
            locks,
        }
    }

    /// Create a pending session for an active profile.
    ///
    /// # Errors
    ///
    /// - `ProfileNotFound` if the profile is missing or belongs to another tenant
    /// - `ProfileInactive` if the profile is deactivated
    /// - `SessionAlreadyActive` if the profile has a non-terminal session
    pub async fn create_session(
        &self,
        cmd: CreateSessionCommand,
        metadata: &CommandMetadata,
    ) -> Result<Session, SessionError> {
        let _guard = self.locks.lock(&cmd.profile_id).await;

        let profile = self
            .profiles
            .find_by_id(&cmd.profile_id)
            .await?
            .filter(|p| p.tenant_id() == &metadata.tenant_id)
            .ok_or(SessionError::ProfileNotFound(cmd.profile_id))?;
        if !profile.is_active() {
            return Err(SessionError::ProfileInactive(cmd.profile_id));
        }

        let objective = cmd
            .objective
            .filter(|o| !o.trim().is_empty())
            .unwrap_or_else(|| cmd.request_text.clone());
        let session = Session::new(NewSession {
            profile_id: cmd.profile_id,
            tenant_id: metadata.tenant_id.clone(),
            requester: metadata.operator_id.clone(),
            request_text: cmd.request_text,
            objective,
            deadline: Timestamp::now().plus_secs(i64::from(profile.max_wait_seconds())),
        })?;

        self.sessions.create_exclusive(&session).await?;

        info!(
            session_id = %session.id(),
            profile_id = %session.profile_id(),
            correlation_id = %metadata.correlation_id(),
            deadline = %session.deadline(),
            "Session created"
        );
        Ok(session)
    }

    pub async fn get(&self, id: &SessionId) -> Result<Session, SessionError> {
        self.sessions
            .find_by_id(id)
            .await?
            .ok_or(SessionError::NotFound(*id))
    }

    pub async fn find_active_for_profile(&self, profile_id: &ProfileId) -> Result<Option<Session>, SessionError> {
        Ok(self.sessions.find_active_by_profile(profile_id).await?)
    }

    /// Record a responder message; the session moves to `waiting_response`.
    pub async fn append_responder_message(&self, id: &SessionId, text: &str) -> Result<Session, SessionError> {
        let (session, applied) = self.apply(id, |s| s.append_responder_message(text)).await?;
        if applied {
            debug!(session_id = %id, seq = session.log().len() - 1, "Responder message appended");
        }
        Ok(session)
    }

    /// Record a message the gateway accepted; the session moves to `navigating`.
    pub async fn append_our_message(&self, id: &SessionId, text: &str) -> Result<Session, SessionError> {
        let (session, applied) = self.apply(id, |s| s.append_our_message(text)).await?;
        if applied {
            debug!(
                session_id = %id,
                messages_sent = session.messages_sent(),
                "Outbound message appended"
            );
        }
        Ok(session)
    }

    /// Complete the session. A no-op returning the stored record if it
    /// already ended.
    pub async fn complete(&self, id: &SessionId, result: &str, summary: &str) -> Result<Session, SessionError> {
        let (session, applied) = self.apply(id, |s| s.complete(result, summary)).await?;
        if applied {
            info!(session_id = %id, profile_id = %session.profile_id(), "Session completed");
        }
        Ok(session)
    }

    /// Fail the session. A no-op returning the stored record if it already
    /// ended.
    pub async fn fail(&self, id: &SessionId, reason: FailureReason) -> Result<Session, SessionError> {
        Ok(self.fail_reporting(id, reason).await?.0)
    }

    /// Fail the session with the timeout reason. Returns whether this call
    /// performed the transition.
    pub async fn expire(&self, id: &SessionId) -> Result<bool, SessionError> {
        Ok(self.fail_reporting(id, FailureReason::timeout()).await?.1)
    }

    /// Operator cancel.
    ///
    /// # Errors
    ///
    /// - `AlreadyTerminal` if the session already ended
    pub async fn cancel(&self, id: &SessionId) -> Result<Session, SessionError> {
        let (session, _) = self
            .apply(id, |s| {
                s.cancel()?;
                Ok(true)
            })
            .await?;
        info!(session_id = %id, "Session cancelled");
        Ok(session)
    }

    async fn fail_reporting(&self, id: &SessionId, reason: FailureReason) -> Result<(Session, bool), SessionError> {
        let kind = reason.kind;
        let message = reason.message.clone();
        let (session, applied) = self.apply(id, |s| s.fail(reason.clone())).await?;
        if applied {
            info!(
                session_id = %id,
                profile_id = %session.profile_id(),
                kind = kind.as_str(),
                reason = %message,
                "Session failed"
            );
        }
        Ok((session, applied))
    }

    /// Load, mutate, and store with a version check, retrying on conflict.
    ///
    /// `mutate` returns `false` for a no-op; nothing is written then.
    async fn apply<F>(&self, id: &SessionId, mut mutate: F) -> Result<(Session, bool), SessionError>
    where
        F: FnMut(&mut Session) -> Result<bool, SessionError> + Send,
    {
        for attempt in 1..=MAX_UPDATE_ATTEMPTS {
            let mut session = self.get(id).await?;
            if !mutate(&mut session)? {
                return Ok((session, false));
            }
            match self.sessions.update(&session).await {
                Ok(()) => return Ok((session, true)),
                Err(DomainError {
                    code: ErrorCode::ConcurrentModification,
                    ..
                }) => {
                    debug!(session_id = %id, attempt, "Concurrent session update, retrying");
                }
                Err(err) => return Err(err.into()),
            }
        }
        Err(SessionError::ConcurrentModification(*id))
    }
}
