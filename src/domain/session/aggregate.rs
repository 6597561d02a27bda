//! Session aggregate.
//!
//! A session is one automated conversation toward a single objective.
//! Its navigation log is append-only; mutations after the session reached
//! a terminal status are no-ops (the mutator reports `false`) so that racing
//! writers such as a cancel and an in-flight turn never error each other out.

use serde::{Deserialize, Serialize};

use super::{FailureReason, LogEntry, Sender, SessionError, SessionOutcome};
use crate::domain::foundation::{
    OperatorId, ProfileId, SessionId, SessionStatus, StateMachine, TenantId, Timestamp,
};

/// Maximum length for the operator's request and the derived objective.
pub const MAX_OBJECTIVE_LENGTH: usize = 2_000;

/// Attributes for a new session.
#[derive(Debug, Clone)]
pub struct NewSession {
    pub profile_id: ProfileId,
    pub tenant_id: TenantId,
    pub requester: OperatorId,
    pub request_text: String,
    pub objective: String,
    pub deadline: Timestamp,
}

/// Session aggregate.
///
/// # Invariants
///
/// - `log[i].seq == i` and timestamps never decrease
/// - `messages_sent` / `messages_received` equal the number of `Us` /
///   `Responder` entries in the log
/// - `outcome` is set iff `status` is terminal
/// - `version` grows by one on every mutation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    id: SessionId,
    profile_id: ProfileId,
    tenant_id: TenantId,
    requester: OperatorId,
    request_text: String,
    objective: String,
    status: SessionStatus,
    log: Vec<LogEntry>,
    messages_sent: u32,
    messages_received: u32,
    last_bot_message: Option<String>,
    last_bot_message_at: Option<Timestamp>,
    last_our_message_at: Option<Timestamp>,
    deadline: Timestamp,
    outcome: Option<SessionOutcome>,
    version: u64,
    created_at: Timestamp,
    updated_at: Timestamp,
}

impl Session {
    /// Create a new pending session.
    ///
    /// # Errors
    ///
    /// - `ValidationFailed` if the objective is empty or too long
    pub fn new(new: NewSession) -> Result<Self, SessionError> {
        let objective = new.objective.trim().to_string();
        if objective.is_empty() {
            return Err(SessionError::validation("objective", "objective cannot be empty"));
        }
        if objective.chars().count() > MAX_OBJECTIVE_LENGTH {
            return Err(SessionError::validation(
                "objective",
                format!("objective exceeds {} characters", MAX_OBJECTIVE_LENGTH),
            ));
        }

        let now = Timestamp::now();
        Ok(Self {
            id: SessionId::new(),
            profile_id: new.profile_id,
            tenant_id: new.tenant_id,
            requester: new.requester,
            request_text: new.request_text,
            objective,
            status: SessionStatus::Pending,
            log: Vec::new(),
            messages_sent: 0,
            messages_received: 0,
            last_bot_message: None,
            last_bot_message_at: None,
            last_our_message_at: None,
            deadline: new.deadline,
            outcome: None,
            version: 0,
            created_at: now,
            updated_at: now,
        })
    }

    /// Reconstitute a session from persistence (no validation).
    #[allow(clippy::too_many_arguments)]
    pub fn reconstitute(
        id: SessionId,
        profile_id: ProfileId,
        tenant_id: TenantId,
        requester: OperatorId,
        request_text: String,
        objective: String,
        status: SessionStatus,
        log: Vec<LogEntry>,
        deadline: Timestamp,
        outcome: Option<SessionOutcome>,
        version: u64,
        created_at: Timestamp,
        updated_at: Timestamp,
    ) -> Self {
        let mut session = Self {
            id,
            profile_id,
            tenant_id,
            requester,
            request_text,
            objective,
            status,
            log: Vec::new(),
            messages_sent: 0,
            messages_received: 0,
            last_bot_message: None,
            last_bot_message_at: None,
            last_our_message_at: None,
            deadline,
            outcome,
            version,
            created_at,
            updated_at,
        };
        for entry in log {
            session.record_counters(&entry);
            session.log.push(entry);
        }
        session
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Accessors
    // ─────────────────────────────────────────────────────────────────────────

    pub fn id(&self) -> &SessionId {
        &self.id
    }

    pub fn profile_id(&self) -> &ProfileId {
        &self.profile_id
    }

    pub fn tenant_id(&self) -> &TenantId {
        &self.tenant_id
    }

    pub fn requester(&self) -> &OperatorId {
        &self.requester
    }

    pub fn request_text(&self) -> &str {
        &self.request_text
    }

    pub fn objective(&self) -> &str {
        &self.objective
    }

    pub fn status(&self) -> SessionStatus {
        self.status
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    pub fn log(&self) -> &[LogEntry] {
        &self.log
    }

    /// The last `n` transcript entries, oldest first.
    pub fn log_tail(&self, n: usize) -> &[LogEntry] {
        let start = self.log.len().saturating_sub(n);
        &self.log[start..]
    }

    pub fn messages_sent(&self) -> u32 {
        self.messages_sent
    }

    pub fn messages_received(&self) -> u32 {
        self.messages_received
    }

    pub fn last_bot_message(&self) -> Option<&str> {
        self.last_bot_message.as_deref()
    }

    pub fn last_bot_message_at(&self) -> Option<&Timestamp> {
        self.last_bot_message_at.as_ref()
    }

    pub fn last_our_message_at(&self) -> Option<&Timestamp> {
        self.last_our_message_at.as_ref()
    }

    pub fn deadline(&self) -> &Timestamp {
        &self.deadline
    }

    /// True once `now` is past the deadline.
    pub fn is_expired_at(&self, now: &Timestamp) -> bool {
        now.is_after(&self.deadline)
    }

    pub fn outcome(&self) -> Option<&SessionOutcome> {
        self.outcome.as_ref()
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn created_at(&self) -> &Timestamp {
        &self.created_at
    }

    pub fn updated_at(&self) -> &Timestamp {
        &self.updated_at
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Mutations
    // ─────────────────────────────────────────────────────────────────────────

    /// Record a message from the responder and wait for our next move.
    ///
    /// Returns `false` without mutating if the session already ended.
    pub fn append_responder_message(&mut self, text: impl Into<String>) -> Result<bool, SessionError> {
        if self.is_terminal() {
            return Ok(false);
        }
        self.move_to(SessionStatus::WaitingResponse)?;
        self.append(Sender::Responder, text.into());
        Ok(true)
    }

    /// Record a message we handed to the transport.
    ///
    /// Returns `false` without mutating if the session already ended.
    pub fn append_our_message(&mut self, text: impl Into<String>) -> Result<bool, SessionError> {
        if self.is_terminal() {
            return Ok(false);
        }
        self.move_to(SessionStatus::Navigating)?;
        self.append(Sender::Us, text.into());
        Ok(true)
    }

    /// Mark the objective satisfied.
    ///
    /// Returns `false` without mutating if the session already ended.
    pub fn complete(
        &mut self,
        result: impl Into<String>,
        summary: impl Into<String>,
    ) -> Result<bool, SessionError> {
        if self.is_terminal() {
            return Ok(false);
        }
        self.move_to(SessionStatus::Completed)?;
        let now = Timestamp::now();
        self.outcome = Some(SessionOutcome {
            success: true,
            result: Some(result.into()),
            summary: summary.into(),
            failure_kind: None,
            reason: "objective satisfied".to_string(),
            finished_at: now,
        });
        self.bump(now);
        Ok(true)
    }

    /// Mark the session failed.
    ///
    /// Returns `false` without mutating if the session already ended.
    pub fn fail(&mut self, reason: FailureReason) -> Result<bool, SessionError> {
        if self.is_terminal() {
            return Ok(false);
        }
        self.move_to(SessionStatus::Failed)?;
        let now = Timestamp::now();
        self.outcome = Some(SessionOutcome {
            success: false,
            result: None,
            summary: reason.message.clone(),
            failure_kind: Some(reason.kind),
            reason: reason.message,
            finished_at: now,
        });
        self.bump(now);
        Ok(true)
    }

    /// Operator-initiated stop. Unlike `fail`, ending an already-ended
    /// session is an error.
    pub fn cancel(&mut self) -> Result<(), SessionError> {
        if self.is_terminal() {
            return Err(SessionError::AlreadyTerminal(self.id));
        }
        self.fail(FailureReason::cancelled())?;
        Ok(())
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Private helpers
    // ─────────────────────────────────────────────────────────────────────────

    fn move_to(&mut self, target: SessionStatus) -> Result<(), SessionError> {
        if self.status != target {
            self.status = self
                .status
                .transition_to(target)
                .map_err(|e| SessionError::invalid_state(e.to_string()))?;
        }
        Ok(())
    }

    fn append(&mut self, sender: Sender, text: String) {
        let now = Timestamp::now();
        let at = match self.log.last() {
            Some(last) => now.max(last.at),
            None => now,
        };
        let entry = LogEntry {
            seq: self.log.len() as u32,
            sender,
            text,
            at,
        };
        self.record_counters(&entry);
        self.log.push(entry);
        self.bump(at);
    }

    fn record_counters(&mut self, entry: &LogEntry) {
        match entry.sender {
            Sender::Responder => {
                self.messages_received += 1;
                self.last_bot_message = Some(entry.text.clone());
                self.last_bot_message_at = Some(entry.at);
            }
            Sender::Us => {
                self.messages_sent += 1;
                self.last_our_message_at = Some(entry.at);
            }
        }
    }

    fn bump(&mut self, at: Timestamp) {
        self.version += 1;
        self.updated_at = at;
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;

    pub fn new_session(profile_id: ProfileId, deadline: Timestamp) -> NewSession {
        NewSession {
            profile_id,
            tenant_id: TenantId::new("tenant-1").unwrap(),
            requester: OperatorId::new("operator-1").unwrap(),
            request_text: "pergunte se está faltando água".to_string(),
            objective: "ask if water is out".to_string(),
            deadline,
        }
    }

    pub fn pending_session() -> Session {
        Session::new(new_session(ProfileId::new(), Timestamp::now().plus_secs(600))).unwrap()
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use super::*;
    use crate::domain::session::FailureKind;
    use proptest::prelude::*;

    #[test]
    fn new_session_is_pending_with_empty_log() {
        let session = pending_session();
        assert_eq!(session.status(), SessionStatus::Pending);
        assert!(session.log().is_empty());
        assert_eq!(session.version(), 0);
        assert!(session.outcome().is_none());
    }

    #[test]
    fn new_rejects_blank_objective() {
        let mut new = new_session(ProfileId::new(), Timestamp::now());
        new.objective = "  ".to_string();
        assert!(matches!(
            Session::new(new),
            Err(SessionError::ValidationFailed { .. })
        ));
    }

    #[test]
    fn our_message_moves_to_navigating_and_counts() {
        let mut session = pending_session();
        assert!(session.append_our_message("Olá").unwrap());

        assert_eq!(session.status(), SessionStatus::Navigating);
        assert_eq!(session.messages_sent(), 1);
        assert!(session.last_our_message_at().is_some());
    }

    #[test]
    fn responder_message_moves_to_waiting_and_tracks_last_message() {
        let mut session = pending_session();
        session.append_our_message("Olá").unwrap();
        session.append_responder_message("Informe seu CPF:").unwrap();

        assert_eq!(session.status(), SessionStatus::WaitingResponse);
        assert_eq!(session.messages_received(), 1);
        assert_eq!(session.last_bot_message(), Some("Informe seu CPF:"));
    }

    #[test]
    fn consecutive_responder_messages_stay_waiting() {
        let mut session = pending_session();
        session.append_responder_message("Bem-vindo").unwrap();
        session.append_responder_message("Escolha uma opção").unwrap();

        assert_eq!(session.status(), SessionStatus::WaitingResponse);
        assert_eq!(session.messages_received(), 2);
    }

    #[test]
    fn complete_records_successful_outcome() {
        let mut session = pending_session();
        session.append_our_message("Olá").unwrap();
        session.append_responder_message("Sem pendências.").unwrap();

        assert!(session.complete("Sem pendências.", "No outage").unwrap());

        let outcome = session.outcome().unwrap();
        assert_eq!(session.status(), SessionStatus::Completed);
        assert!(outcome.success);
        assert_eq!(outcome.result.as_deref(), Some("Sem pendências."));
        assert_eq!(outcome.summary, "No outage");
    }

    #[test]
    fn complete_twice_is_a_no_op() {
        let mut session = pending_session();
        session.append_our_message("Olá").unwrap();
        session.complete("first", "first").unwrap();
        let snapshot = session.clone();

        assert!(!session.complete("second", "second").unwrap());
        assert_eq!(session, snapshot);
    }

    #[test]
    fn fail_twice_is_a_no_op() {
        let mut session = pending_session();
        session.fail(FailureReason::timeout()).unwrap();
        let snapshot = session.clone();

        assert!(!session
            .fail(FailureReason::new(FailureKind::Dispatch, "later"))
            .unwrap());
        assert_eq!(session, snapshot);
    }

    #[test]
    fn appends_after_terminal_are_ignored() {
        let mut session = pending_session();
        session.fail(FailureReason::timeout()).unwrap();

        assert!(!session.append_responder_message("late").unwrap());
        assert!(!session.append_our_message("late").unwrap());
        assert!(session.log().is_empty());
    }

    #[test]
    fn pending_session_can_fail_with_reason() {
        let mut session = pending_session();
        session.fail(FailureReason::timeout()).unwrap();

        let outcome = session.outcome().unwrap();
        assert_eq!(session.status(), SessionStatus::Failed);
        assert!(!outcome.success);
        assert_eq!(outcome.failure_kind, Some(FailureKind::Timeout));
        assert!(outcome.reason.contains("timeout"));
    }

    #[test]
    fn pending_session_cannot_complete() {
        let mut session = pending_session();
        assert!(matches!(
            session.complete("x", "y"),
            Err(SessionError::InvalidState(_))
        ));
    }

    #[test]
    fn cancel_rejects_terminal_session() {
        let mut session = pending_session();
        session.cancel().unwrap();
        assert_eq!(
            session.outcome().unwrap().failure_kind,
            Some(FailureKind::Cancelled)
        );
        assert_eq!(
            session.cancel(),
            Err(SessionError::AlreadyTerminal(*session.id()))
        );
    }

    #[test]
    fn log_tail_returns_latest_entries_in_order() {
        let mut session = pending_session();
        for i in 0..5 {
            session.append_our_message(format!("m{}", i)).unwrap();
        }
        let tail: Vec<&str> = session.log_tail(2).iter().map(|e| e.text.as_str()).collect();
        assert_eq!(tail, vec!["m3", "m4"]);
        assert_eq!(session.log_tail(50).len(), 5);
    }

    #[test]
    fn expiry_compares_against_deadline() {
        let session =
            Session::new(new_session(ProfileId::new(), Timestamp::now().minus_secs(1))).unwrap();
        assert!(session.is_expired_at(&Timestamp::now()));
    }

    #[test]
    fn reconstitute_recomputes_counters() {
        let mut session = pending_session();
        session.append_our_message("Olá").unwrap();
        session.append_responder_message("Menu").unwrap();
        session.append_our_message("1").unwrap();

        let restored = Session::reconstitute(
            *session.id(),
            *session.profile_id(),
            session.tenant_id().clone(),
            session.requester().clone(),
            session.request_text().to_string(),
            session.objective().to_string(),
            session.status(),
            session.log().to_vec(),
            *session.deadline(),
            None,
            session.version(),
            *session.created_at(),
            *session.updated_at(),
        );

        assert_eq!(restored.messages_sent(), 2);
        assert_eq!(restored.messages_received(), 1);
        assert_eq!(restored.last_bot_message(), Some("Menu"));
    }

    proptest! {
        #[test]
        fn log_is_gap_free_and_monotonic(senders in prop::collection::vec(any::<bool>(), 0..40)) {
            let mut session = pending_session();
            for (i, ours) in senders.iter().enumerate() {
                if *ours {
                    session.append_our_message(format!("us {}", i)).unwrap();
                } else {
                    session.append_responder_message(format!("bot {}", i)).unwrap();
                }
            }

            let log = session.log();
            prop_assert_eq!(log.len(), senders.len());
            for (i, entry) in log.iter().enumerate() {
                prop_assert_eq!(entry.seq as usize, i);
            }
            for pair in log.windows(2) {
                prop_assert!(pair[0].at <= pair[1].at);
            }
            let sent = senders.iter().filter(|ours| **ours).count() as u32;
            prop_assert_eq!(session.messages_sent(), sent);
            prop_assert_eq!(session.messages_received(), senders.len() as u32 - sent);
            prop_assert_eq!(session.version(), senders.len() as u64);
        }
    }
}
