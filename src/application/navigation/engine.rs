//! NavigationEngine - Drives a session turn by turn.
//!
//! `initiate` sends the opening message of a fresh session. `handle_incoming`
//! reacts to each responder message: transcribe, check the message budget,
//! ask the decision source, and carry out the classified action. Both hold
//! the profile lock for the whole turn, so one profile never has two turns
//! in flight.

use std::sync::Arc;
use std::time::Duration;

use tracing::{error, info, warn};

use super::{KeyedLocks, SessionManager};
use crate::domain::foundation::{ProfileId, SessionId};
use crate::domain::navigation::{
    CeilingPolicy, DecisionRequest, GenerationRequest, MessageBudget, NavigationAction, ReplyDelay,
    SummaryRequest, DEFAULT_TRANSCRIPT_TAIL,
};
use crate::domain::profile::{ChannelAddress, Profile};
use crate::domain::session::{FailureKind, FailureReason, Session, SessionError};
use crate::ports::{
    DecisionEngine, DecisionError, GatewayError, MessageGateway, Notification, NotificationSink,
    ProfileRepository,
};

/// Tunables for navigation turns.
#[derive(Debug, Clone)]
pub struct NavigationSettings {
    pub ceiling_policy: CeilingPolicy,
    /// Ceiling under `CeilingPolicy::Fixed`.
    pub message_ceiling: u32,
    pub reply_delay: ReplyDelay,
    pub decision_timeout: Duration,
    pub dispatch_timeout: Duration,
    pub transcript_tail: usize,
}

impl Default for NavigationSettings {
    fn default() -> Self {
        Self {
            ceiling_policy: CeilingPolicy::Fixed,
            message_ceiling: 20,
            reply_delay: ReplyDelay::default(),
            decision_timeout: Duration::from_secs(60),
            dispatch_timeout: Duration::from_secs(10),
            transcript_tail: DEFAULT_TRANSCRIPT_TAIL,
        }
    }
}

/// Result of routing one inbound message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IncomingOutcome {
    /// No automated session for the sender; ordinary traffic.
    NotHandled,
    /// The message belonged to `session`, shown after the turn.
    Handled {
        session: Box<Session>,
        action: &'static str,
    },
}

impl IncomingOutcome {
    pub fn is_handled(&self) -> bool {
        matches!(self, IncomingOutcome::Handled { .. })
    }

    pub fn session(&self) -> Option<&Session> {
        match self {
            IncomingOutcome::Handled { session, .. } => Some(session),
            IncomingOutcome::NotHandled => None,
        }
    }
}

pub struct NavigationEngine {
    manager: Arc<SessionManager>,
    profiles: Arc<dyn ProfileRepository>,
    decisions: Arc<dyn DecisionEngine>,
    gateway: Arc<dyn MessageGateway>,
    notifications: Arc<dyn NotificationSink>,
    locks: Arc<KeyedLocks<ProfileId>>,
    settings: NavigationSettings,
}

impl NavigationEngine {
    pub fn new(
        manager: Arc<SessionManager>,
        profiles: Arc<dyn ProfileRepository>,
        decisions: Arc<dyn DecisionEngine>,
        gateway: Arc<dyn MessageGateway>,
        notifications: Arc<dyn NotificationSink>,
        locks: Arc<KeyedLocks<ProfileId>>,
        settings: NavigationSettings,
    ) -> Self {
        Self {
            manager,
            profiles,
            decisions,
            gateway,
            notifications,
            locks,
            settings,
        }
    }

    pub fn settings(&self) -> &NavigationSettings {
        &self.settings
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Initiate
    // ─────────────────────────────────────────────────────────────────────────

    /// Generate and send the opening message of a new session.
    ///
    /// Generation and dispatch failures fail the session instead of
    /// returning an error.
    pub async fn initiate(&self, session_id: &SessionId) -> Result<Session, SessionError> {
        let profile_id = *self.manager.get(session_id).await?.profile_id();
        let _guard = self.locks.lock(&profile_id).await;

        let session = self.manager.get(session_id).await?;
        if session.is_terminal() {
            return Ok(session);
        }
        let profile = self.load_profile(&profile_id).await?;

        let request = GenerationRequest::build(&profile, &session);
        let opening = match self.generate(&request, session_id).await {
            Ok(text) => text,
            Err(err) => {
                error!(session_id = %session_id, error = %err, "Opening message generation failed");
                return self
                    .manager
                    .fail(
                        session_id,
                        FailureReason::new(
                            FailureKind::Generation,
                            format!("opening message generation failed: {}", err),
                        ),
                    )
                    .await;
            }
        };

        let session = self.send_and_record(&profile, session_id, &opening).await?;
        if !session.is_terminal() {
            info!(session_id = %session_id, profile_id = %profile_id, "Session initiated");
        }
        Ok(session)
    }

    /// `initiate` on its own task. Dropping the returned future does not
    /// interrupt the turn.
    pub async fn spawn_initiate(self: &Arc<Self>, session_id: SessionId) -> Result<Session, SessionError> {
        let engine = Arc::clone(self);
        tokio::spawn(async move { engine.initiate(&session_id).await })
            .await
            .map_err(|err| SessionError::infrastructure(format!("opening turn aborted: {}", err)))?
    }

    /// Empty or malformed output falls back to a fixed opening; backend
    /// failures and timeouts are returned.
    async fn generate(&self, request: &GenerationRequest, session_id: &SessionId) -> Result<String, DecisionError> {
        let timeout = self.settings.decision_timeout;
        let generated = match tokio::time::timeout(timeout, self.decisions.generate(request)).await {
            Ok(result) => result,
            Err(_) => Err(DecisionError::Timeout(timeout.as_secs())),
        };
        match generated {
            Ok(text) if !text.trim().is_empty() => Ok(text.trim().to_string()),
            Ok(_) => {
                warn!(session_id = %session_id, "Empty opening message, using fallback");
                Ok(request.fallback_message())
            }
            Err(DecisionError::Malformed(detail)) => {
                warn!(session_id = %session_id, detail = %detail, "Malformed opening message, using fallback");
                Ok(request.fallback_message())
            }
            Err(err) => Err(err),
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // HandleIncoming
    // ─────────────────────────────────────────────────────────────────────────

    /// Route one inbound responder message.
    pub async fn handle_incoming(&self, from: &ChannelAddress, text: &str) -> Result<IncomingOutcome, SessionError> {
        let Some(profile_id) = self.resolve_profile(from).await? else {
            return Ok(IncomingOutcome::NotHandled);
        };
        let _guard = self.locks.lock(&profile_id).await;

        // The session may have ended while we waited for the lock.
        let Some(session) = self.manager.find_active_for_profile(&profile_id).await? else {
            return Ok(IncomingOutcome::NotHandled);
        };
        let session_id = *session.id();
        let profile = self.load_profile(&profile_id).await?;

        let session = self.manager.append_responder_message(&session_id, text).await?;
        if session.is_terminal() {
            return Ok(handled(session, "wait"));
        }

        let budget = MessageBudget::resolve(
            self.settings.ceiling_policy,
            self.settings.message_ceiling,
            profile.max_retries(),
        );
        if budget.is_exhausted(session.messages_sent()) {
            warn!(
                session_id = %session_id,
                messages_sent = session.messages_sent(),
                ceiling = budget.ceiling(),
                "Message budget exhausted"
            );
            let session = self
                .manager
                .fail(&session_id, FailureReason::budget_exhausted(session.messages_sent()))
                .await?;
            return Ok(handled(session, "fail"));
        }

        let request = DecisionRequest::build(&profile, &session, self.settings.transcript_tail, budget.ceiling());
        let action = self.decide(&request, &session_id).await;
        info!(session_id = %session_id, action = action.as_str(), "Decision classified");

        let name = action.as_str();
        let session = self.execute(action, &profile, &session).await?;
        Ok(handled(session, name))
    }

    /// `handle_incoming` on its own task. Once started, the turn runs to the
    /// end even if the caller goes away.
    pub async fn spawn_incoming(self: &Arc<Self>, from: ChannelAddress, text: String) -> Result<IncomingOutcome, SessionError> {
        let engine = Arc::clone(self);
        tokio::spawn(async move { engine.handle_incoming(&from, &text).await })
            .await
            .map_err(|err| SessionError::infrastructure(format!("navigation turn aborted: {}", err)))?
    }

    /// Every failure mode collapses to `Wait`.
    async fn decide(&self, request: &DecisionRequest, session_id: &SessionId) -> NavigationAction {
        let timeout = self.settings.decision_timeout;
        match tokio::time::timeout(timeout, self.decisions.decide(request)).await {
            Ok(Ok(output)) => NavigationAction::classify(&output),
            Ok(Err(err)) => {
                warn!(session_id = %session_id, error = %err, "Decision failed, waiting");
                NavigationAction::wait(err.to_string())
            }
            Err(_) => {
                warn!(session_id = %session_id, timeout_secs = timeout.as_secs(), "Decision timed out, waiting");
                NavigationAction::wait("decision timed out")
            }
        }
    }

    async fn execute(&self, action: NavigationAction, profile: &Profile, session: &Session) -> Result<Session, SessionError> {
        let session_id = session.id();
        match action {
            NavigationAction::Respond { text } => {
                if profile.style().uses_menu() {
                    if let Some(option) = profile.exit_option_for(&text) {
                        info!(session_id = %session_id, option = %option.value, "Exit option chosen, not sending");
                        return self
                            .manager
                            .fail(
                                session_id,
                                FailureReason::new(
                                    FailureKind::Declined,
                                    format!("exit option selected: {}", option.label),
                                ),
                            )
                            .await;
                    }
                }
                self.send_and_record(profile, session_id, &text).await
            }
            NavigationAction::Complete { result } => {
                let current = self.manager.get(session_id).await?;
                if current.is_terminal() {
                    info!(session_id = %session_id, "Session ended during decision, not completing");
                    return Ok(current);
                }
                let result = result
                    .or_else(|| session.last_bot_message().map(str::to_string))
                    .unwrap_or_default();
                let summary = self.summarize(&SummaryRequest::new(session.objective(), &result)).await;
                let completed = self.manager.complete(session_id, &result, &summary).await?;
                if completed.outcome().is_some_and(|o| o.success) {
                    self.notify_completion(profile, &completed, &result).await;
                }
                Ok(completed)
            }
            NavigationAction::Fail { reason } => {
                self.manager
                    .fail(session_id, FailureReason::new(FailureKind::Declined, reason))
                    .await
            }
            NavigationAction::Wait { reason } => {
                info!(
                    session_id = %session_id,
                    reason = reason.as_deref().unwrap_or(""),
                    "Waiting for next responder message"
                );
                Ok(session.clone())
            }
        }
    }

    async fn summarize(&self, request: &SummaryRequest) -> String {
        match tokio::time::timeout(self.settings.decision_timeout, self.decisions.summarize(request)).await {
            Ok(Ok(summary)) if !summary.trim().is_empty() => summary.trim().to_string(),
            Ok(Ok(_)) => request.fallback_summary(),
            Ok(Err(err)) => {
                warn!(error = %err, "Summary failed, using fallback");
                request.fallback_summary()
            }
            Err(_) => {
                warn!("Summary timed out, using fallback");
                request.fallback_summary()
            }
        }
    }

    async fn notify_completion(&self, profile: &Profile, session: &Session, result: &str) {
        let notification = Notification::new(
            session.tenant_id().clone(),
            session.requester().clone(),
            format!("Automation completed: {}", profile.name()),
            result,
        )
        .with_metadata("session_id", session.id().to_string())
        .with_metadata("profile_id", profile.id().to_string())
        .with_metadata("objective", session.objective());

        if let Err(err) = self.notifications.notify(notification).await {
            warn!(session_id = %session.id(), error = %err, "Completion notification failed");
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Helpers
    // ─────────────────────────────────────────────────────────────────────────

    /// The profile for `from` that currently has an active session.
    async fn resolve_profile(&self, from: &ChannelAddress) -> Result<Option<ProfileId>, SessionError> {
        for profile in self.profiles.find_by_channel(from).await? {
            if self.manager.find_active_for_profile(profile.id()).await?.is_some() {
                return Ok(Some(*profile.id()));
            }
        }
        Ok(None)
    }

    async fn load_profile(&self, id: &ProfileId) -> Result<Profile, SessionError> {
        self.profiles
            .find_by_id(id)
            .await?
            .ok_or(SessionError::ProfileNotFound(*id))
    }

    /// Pause like a person would, then send `text` and log it. Nothing is
    /// sent if the session ended while we paused or decided.
    async fn send_and_record(&self, profile: &Profile, session_id: &SessionId, text: &str) -> Result<Session, SessionError> {
        let delay = self.settings.reply_delay.sample();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        let current = self.manager.get(session_id).await?;
        if current.is_terminal() {
            info!(session_id = %session_id, "Session ended before dispatch, not sending");
            return Ok(current);
        }

        if let Err(err) = self.dispatch(profile, text).await {
            return self.fail_dispatch(session_id, err).await;
        }
        let session = self.manager.append_our_message(session_id, text).await?;
        if session.is_terminal() {
            warn!(session_id = %session_id, "Session ended while sending; message delivered but not logged");
        }
        Ok(session)
    }

    async fn dispatch(&self, profile: &Profile, text: &str) -> Result<(), GatewayError> {
        let timeout = self.settings.dispatch_timeout;
        match tokio::time::timeout(timeout, self.gateway.send(profile.channel_address(), text)).await {
            Ok(result) => result,
            Err(_) => Err(GatewayError::Timeout(timeout.as_secs())),
        }
    }

    async fn fail_dispatch(&self, session_id: &SessionId, err: GatewayError) -> Result<Session, SessionError> {
        error!(session_id = %session_id, error = %err, "Dispatch failed");
        self.manager
            .fail(
                session_id,
                FailureReason::new(FailureKind::Dispatch, format!("message dispatch failed: {}", err)),
            )
            .await
    }
}

fn handled(session: Session, action: &'static str) -> IncomingOutcome {
    IncomingOutcome::Handled {
        session: Box::new(session),
        action,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::{InMemoryProfileRepository, InMemorySessionRepository};
    use crate::application::navigation::CreateSessionCommand;
    use crate::domain::foundation::{CommandMetadata, OperatorId, SessionStatus, TenantId};
    use crate::domain::intent::{IntentCandidate, IntentClassification};
    use crate::domain::navigation::DecisionOutput;
    use crate::domain::profile::fixtures::profile_with_cpf;
    use crate::domain::profile::MenuOption;
    use crate::ports::NotificationError;
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    // ─────────────────────────────────────────────────────────────────────
    // Mocks
    // ─────────────────────────────────────────────────────────────────────

    #[derive(Default)]
    struct ScriptedDecisions {
        opening: Mutex<Option<Result<String, DecisionError>>>,
        decisions: Mutex<VecDeque<Result<DecisionOutput, DecisionError>>>,
        requests: Mutex<Vec<DecisionRequest>>,
        hang: bool,
    }

    impl ScriptedDecisions {
        fn opening(self, opening: Result<String, DecisionError>) -> Self {
            *self.opening.lock().unwrap() = Some(opening);
            self
        }

        fn then(self, decision: Result<DecisionOutput, DecisionError>) -> Self {
            self.decisions.lock().unwrap().push_back(decision);
            self
        }

        /// `decide` never resolves.
        fn hanging(mut self) -> Self {
            self.hang = true;
            self
        }
    }

    #[async_trait]
    impl DecisionEngine for ScriptedDecisions {
        async fn generate(&self, _request: &GenerationRequest) -> Result<String, DecisionError> {
            self.opening
                .lock()
                .unwrap()
                .clone()
                .unwrap_or_else(|| Ok("Olá, gostaria de saber se há falta de água.".to_string()))
        }

        async fn decide(&self, request: &DecisionRequest) -> Result<DecisionOutput, DecisionError> {
            self.requests.lock().unwrap().push(request.clone());
            if self.hang {
                std::future::pending::<()>().await;
            }
            self.decisions
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Ok(DecisionOutput::new("wait")))
        }

        async fn summarize(&self, _request: &SummaryRequest) -> Result<String, DecisionError> {
            Err(DecisionError::backend("offline"))
        }

        async fn classify_intent(
            &self,
            _text: &str,
            _candidates: &[IntentCandidate],
        ) -> Result<IntentClassification, DecisionError> {
            Ok(IntentClassification::not_automation())
        }
    }

    #[derive(Default)]
    struct RecordingGateway {
        sent: Mutex<Vec<(String, String)>>,
        fail: bool,
        /// Sends of this text never resolve.
        hang_on: Option<&'static str>,
    }

    #[async_trait]
    impl MessageGateway for RecordingGateway {
        async fn send(&self, to: &ChannelAddress, text: &str) -> Result<(), GatewayError> {
            if self.fail {
                return Err(GatewayError::Network("connection refused".to_string()));
            }
            if self.hang_on == Some(text) {
                std::future::pending::<()>().await;
            }
            self.sent.lock().unwrap().push((to.to_string(), text.to_string()));
            Ok(())
        }
    }

    #[derive(Default)]
    struct RecordingSink {
        notifications: Mutex<Vec<Notification>>,
        fail: bool,
    }

    #[async_trait]
    impl NotificationSink for RecordingSink {
        async fn notify(&self, notification: Notification) -> Result<(), NotificationError> {
            self.notifications.lock().unwrap().push(notification);
            if self.fail {
                return Err(NotificationError::Delivery("sink down".to_string()));
            }
            Ok(())
        }
    }

    struct Harness {
        engine: NavigationEngine,
        manager: Arc<SessionManager>,
        profile: Profile,
        gateway: Arc<RecordingGateway>,
        sink: Arc<RecordingSink>,
        decisions: Arc<ScriptedDecisions>,
    }

    impl Harness {
        async fn start_session(&self) -> Session {
            let metadata = CommandMetadata::new(
                TenantId::new("tenant-1").unwrap(),
                OperatorId::new("operator-1").unwrap(),
            );
            let session = self
                .manager
                .create_session(
                    CreateSessionCommand {
                        profile_id: *self.profile.id(),
                        request_text: "pergunte se está faltando água".to_string(),
                        objective: None,
                    },
                    &metadata,
                )
                .await
                .unwrap();
            self.engine.initiate(session.id()).await.unwrap()
        }

        async fn incoming(&self, text: &str) -> IncomingOutcome {
            self.engine
                .handle_incoming(self.profile.channel_address(), text)
                .await
                .unwrap()
        }
    }

    async fn harness_with(
        profile: Profile,
        decisions: ScriptedDecisions,
        gateway: RecordingGateway,
        sink: RecordingSink,
        settings: NavigationSettings,
    ) -> Harness {
        let profiles = Arc::new(InMemoryProfileRepository::new());
        profiles.create(&profile).await.unwrap();
        let locks = Arc::new(KeyedLocks::new());
        let manager = Arc::new(SessionManager::new(
            Arc::new(InMemorySessionRepository::new()),
            profiles.clone(),
            locks.clone(),
        ));
        let decisions = Arc::new(decisions);
        let gateway = Arc::new(gateway);
        let sink = Arc::new(sink);
        let engine = NavigationEngine::new(
            manager.clone(),
            profiles,
            decisions.clone(),
            gateway.clone(),
            sink.clone(),
            locks,
            settings,
        );
        Harness {
            engine,
            manager,
            profile,
            gateway,
            sink,
            decisions,
        }
    }

    fn fast_settings() -> NavigationSettings {
        NavigationSettings {
            reply_delay: ReplyDelay::none(),
            ..NavigationSettings::default()
        }
    }

    async fn harness(decisions: ScriptedDecisions) -> Harness {
        harness_with(
            profile_with_cpf(),
            decisions,
            RecordingGateway::default(),
            RecordingSink::default(),
            fast_settings(),
        )
        .await
    }

    // ─────────────────────────────────────────────────────────────────────
    // Tests
    // ─────────────────────────────────────────────────────────────────────

    #[tokio::test]
    async fn initiate_sends_opening_and_records_it() {
        let h = harness(ScriptedDecisions::default()).await;
        let session = h.start_session().await;

        assert_eq!(session.status(), SessionStatus::Navigating);
        assert_eq!(session.messages_sent(), 1);
        let sent = h.gateway.sent.lock().unwrap().clone();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].0, "5511999990000");
    }

    #[tokio::test]
    async fn initiate_falls_back_on_malformed_generation() {
        let h = harness(ScriptedDecisions::default().opening(Err(DecisionError::malformed("{")))).await;
        let session = h.start_session().await;

        assert_eq!(session.status(), SessionStatus::Navigating);
        assert!(session.log()[0].text.contains("pergunte se está faltando água"));
    }

    #[tokio::test]
    async fn initiate_fails_session_when_generation_backend_fails() {
        let h = harness(ScriptedDecisions::default().opening(Err(DecisionError::backend("503")))).await;
        let session = h.start_session().await;

        assert_eq!(session.status(), SessionStatus::Failed);
        assert_eq!(session.outcome().unwrap().failure_kind, Some(FailureKind::Generation));
        assert!(h.gateway.sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn initiate_fails_session_when_dispatch_fails() {
        let h = harness_with(
            profile_with_cpf(),
            ScriptedDecisions::default(),
            RecordingGateway {
                fail: true,
                ..RecordingGateway::default()
            },
            RecordingSink::default(),
            fast_settings(),
        )
        .await;
        let session = h.start_session().await;

        assert_eq!(session.status(), SessionStatus::Failed);
        assert_eq!(session.outcome().unwrap().failure_kind, Some(FailureKind::Dispatch));
        assert!(session.log().is_empty());
    }

    #[tokio::test]
    async fn respond_dispatches_and_appends() {
        let h = harness(
            ScriptedDecisions::default().then(Ok(DecisionOutput::new("respond").with_response("111.111.111-11"))),
        )
        .await;
        h.start_session().await;

        let outcome = h.incoming("Informe seu CPF:").await;
        let session = outcome.session().unwrap();

        assert_eq!(session.status(), SessionStatus::Navigating);
        assert_eq!(session.messages_sent(), 2);
        assert_eq!(session.log().last().unwrap().text, "111.111.111-11");
        let request = h.decisions.requests.lock().unwrap()[0].clone();
        assert_eq!(request.transcript.last().unwrap().text, "Informe seu CPF:");
    }

    #[tokio::test]
    async fn unknown_sender_is_not_handled() {
        let h = harness(ScriptedDecisions::default()).await;
        h.start_session().await;

        let stranger = ChannelAddress::parse("5521000000000").unwrap();
        let outcome = h.engine.handle_incoming(&stranger, "oi").await.unwrap();
        assert_eq!(outcome, IncomingOutcome::NotHandled);
    }

    #[tokio::test]
    async fn profile_without_active_session_is_not_handled() {
        let h = harness(ScriptedDecisions::default()).await;
        assert!(!h.incoming("Bem-vindo!").await.is_handled());
    }

    #[tokio::test]
    async fn decision_error_is_coerced_to_wait() {
        let h = harness(ScriptedDecisions::default().then(Err(DecisionError::malformed("not json")))).await;
        h.start_session().await;

        let outcome = h.incoming("Menu: 1) Conta 2) Falta de água").await;
        assert!(matches!(outcome, IncomingOutcome::Handled { action: "wait", .. }));
        assert_eq!(outcome.session().unwrap().status(), SessionStatus::WaitingResponse);
    }

    #[tokio::test]
    async fn complete_uses_responder_message_and_notifies() {
        let h = harness(ScriptedDecisions::default().then(Ok(DecisionOutput::new("complete")))).await;
        h.start_session().await;

        let outcome = h.incoming("Não há interrupções na sua região.").await;
        let session = outcome.session().unwrap();
        let result = session.outcome().unwrap();

        assert_eq!(session.status(), SessionStatus::Completed);
        assert_eq!(result.result.as_deref(), Some("Não há interrupções na sua região."));
        // Summarize failed, so the fallback summary is used.
        assert!(result.summary.starts_with("pergunte se está faltando água"));

        let notifications = h.sink.notifications.lock().unwrap().clone();
        assert_eq!(notifications.len(), 1);
        assert_eq!(notifications[0].title, "Automation completed: Companhia de Água");
        assert_eq!(notifications[0].recipient.as_str(), "operator-1");
    }

    #[tokio::test]
    async fn notification_failure_keeps_completion() {
        let h = harness_with(
            profile_with_cpf(),
            ScriptedDecisions::default().then(Ok(DecisionOutput::new("complete").with_extracted_result("ok"))),
            RecordingGateway::default(),
            RecordingSink {
                fail: true,
                ..RecordingSink::default()
            },
            fast_settings(),
        )
        .await;
        let session = h.start_session().await;

        h.incoming("Tudo certo").await;
        let stored = h.manager.get(session.id()).await.unwrap();
        assert_eq!(stored.status(), SessionStatus::Completed);
    }

    #[tokio::test]
    async fn fail_records_decision_reason() {
        let h = harness(
            ScriptedDecisions::default().then(Ok(DecisionOutput::new("fail").with_reason("bot only handles billing"))),
        )
        .await;
        h.start_session().await;

        let outcome = h.incoming("Só atendemos segunda via.").await;
        let result = outcome.session().unwrap().outcome().unwrap().clone();
        assert_eq!(result.failure_kind, Some(FailureKind::Declined));
        assert_eq!(result.reason, "bot only handles billing");
    }

    #[tokio::test]
    async fn exit_option_is_not_sent() {
        let mut profile = profile_with_cpf();
        profile
            .add_menu_option(MenuOption::new("9", "Encerrar atendimento").unwrap().exit())
            .unwrap();
        let h = harness_with(
            profile,
            ScriptedDecisions::default().then(Ok(DecisionOutput::new("respond").with_response("9"))),
            RecordingGateway::default(),
            RecordingSink::default(),
            fast_settings(),
        )
        .await;
        h.start_session().await;

        let outcome = h.incoming("Digite 9 para sair").await;
        let session = outcome.session().unwrap();

        assert_eq!(session.status(), SessionStatus::Failed);
        assert_eq!(
            session.outcome().unwrap().reason,
            "exit option selected: Encerrar atendimento"
        );
        assert_eq!(h.gateway.sent.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn budget_trips_before_decision() {
        let h = harness_with(
            profile_with_cpf(),
            ScriptedDecisions::default()
                .then(Ok(DecisionOutput::new("respond").with_response("1")))
                .then(Ok(DecisionOutput::new("respond").with_response("2"))),
            RecordingGateway::default(),
            RecordingSink::default(),
            NavigationSettings {
                message_ceiling: 2,
                ..fast_settings()
            },
        )
        .await;
        h.start_session().await;

        h.incoming("Menu").await;
        let outcome = h.incoming("Menu again").await;
        let session = outcome.session().unwrap();

        assert_eq!(session.status(), SessionStatus::Failed);
        assert_eq!(session.outcome().unwrap().failure_kind, Some(FailureKind::BudgetExhausted));
        assert_eq!(h.decisions.requests.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn profile_policy_uses_max_retries() {
        let h = harness_with(
            profile_with_cpf(),
            ScriptedDecisions::default(),
            RecordingGateway::default(),
            RecordingSink::default(),
            NavigationSettings {
                ceiling_policy: CeilingPolicy::ProfileMaxRetries,
                message_ceiling: 20,
                ..fast_settings()
            },
        )
        .await;
        h.start_session().await;

        // Fixture profile allows 3 messages; one is spent on the opening.
        let outcome = h.incoming("Olá").await;
        assert_eq!(outcome.session().unwrap().status(), SessionStatus::WaitingResponse);
        let request = h.decisions.requests.lock().unwrap()[0].clone();
        assert_eq!(request.counters.message_ceiling, 3);
    }

    #[tokio::test]
    async fn stuck_decision_times_out_to_wait() {
        let h = harness_with(
            profile_with_cpf(),
            ScriptedDecisions::default().hanging(),
            RecordingGateway::default(),
            RecordingSink::default(),
            NavigationSettings {
                decision_timeout: Duration::from_millis(50),
                ..fast_settings()
            },
        )
        .await;
        h.start_session().await;

        let outcome = h.incoming("Informe seu CPF:").await;

        assert!(matches!(outcome, IncomingOutcome::Handled { action: "wait", .. }));
        assert_eq!(outcome.session().unwrap().status(), SessionStatus::WaitingResponse);
        assert_eq!(h.gateway.sent.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn stuck_dispatch_times_out_and_fails() {
        let h = harness_with(
            profile_with_cpf(),
            ScriptedDecisions::default().then(Ok(DecisionOutput::new("respond").with_response("111.111.111-11"))),
            RecordingGateway {
                hang_on: Some("111.111.111-11"),
                ..RecordingGateway::default()
            },
            RecordingSink::default(),
            NavigationSettings {
                dispatch_timeout: Duration::from_millis(50),
                ..fast_settings()
            },
        )
        .await;
        h.start_session().await;

        let outcome = h.incoming("Informe seu CPF:").await;
        let session = outcome.session().unwrap();

        assert_eq!(session.status(), SessionStatus::Failed);
        assert_eq!(session.outcome().unwrap().failure_kind, Some(FailureKind::Dispatch));
        assert_eq!(session.messages_sent(), 1);
    }

    #[tokio::test]
    async fn turn_finishes_after_caller_is_dropped() {
        let profile = profile_with_cpf();
        let profiles = Arc::new(InMemoryProfileRepository::new());
        profiles.create(&profile).await.unwrap();
        let locks = Arc::new(KeyedLocks::new());
        let manager = Arc::new(SessionManager::new(
            Arc::new(InMemorySessionRepository::new()),
            profiles.clone(),
            locks.clone(),
        ));
        let gateway = Arc::new(RecordingGateway::default());
        let engine = Arc::new(NavigationEngine::new(
            manager.clone(),
            profiles,
            Arc::new(ScriptedDecisions::default()),
            gateway.clone(),
            Arc::new(RecordingSink::default()),
            locks,
            fast_settings(),
        ));
        let metadata = CommandMetadata::new(
            TenantId::new("tenant-1").unwrap(),
            OperatorId::new("operator-1").unwrap(),
        );
        let session = manager
            .create_session(
                CreateSessionCommand {
                    profile_id: *profile.id(),
                    request_text: "pergunte se está faltando água".to_string(),
                    objective: None,
                },
                &metadata,
            )
            .await
            .unwrap();
        engine.spawn_initiate(*session.id()).await.unwrap();

        // Hold the profile lock so the turn queues, then give up on it.
        let guard = engine.locks.lock(profile.id()).await;
        let caller = tokio::time::timeout(
            Duration::from_millis(20),
            engine.spawn_incoming(profile.channel_address().clone(), "Informe seu CPF:".to_string()),
        )
        .await;
        assert!(caller.is_err());
        drop(guard);

        let mut stored = manager.get(session.id()).await.unwrap();
        for _ in 0..50 {
            if stored.log().len() == 2 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
            stored = manager.get(session.id()).await.unwrap();
        }
        assert_eq!(stored.log().len(), 2);
        assert_eq!(stored.log()[1].text, "Informe seu CPF:");
    }
}
