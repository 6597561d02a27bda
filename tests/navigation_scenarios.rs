//! End-to-end navigation scenarios over the in-memory adapters.
//!
//! Each test wires a full engine (session manager, navigation engine,
//! expiry sweeper) with a scripted decision engine, the recording gateway
//! and the in-memory notification sink.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use chat_autopilot::adapters::gateway::RecordingGateway;
use chat_autopilot::adapters::memory::{InMemoryProfileRepository, InMemorySessionRepository};
use chat_autopilot::adapters::notification::InMemoryNotificationSink;
use chat_autopilot::application::navigation::{
    CreateSessionCommand, ExpirySweeper, IncomingOutcome, KeyedLocks, NavigationEngine, NavigationSettings,
    SessionManager,
};
use chat_autopilot::domain::foundation::{CommandMetadata, OperatorId, SessionStatus, TenantId, Timestamp};
use chat_autopilot::domain::intent::{IntentCandidate, IntentClassification};
use chat_autopilot::domain::navigation::{
    CeilingPolicy, DecisionOutput, DecisionRequest, GenerationRequest, ReplyDelay, SummaryRequest,
};
use chat_autopilot::domain::profile::{ChannelAddress, Field, FieldType, MenuOption, NewProfile, Profile};
use chat_autopilot::domain::session::{FailureKind, NewSession, Session, SessionError};
use chat_autopilot::ports::{DecisionEngine, DecisionError, GatewayError, ProfileRepository, SessionRepository};

// =============================================================================
// Test Infrastructure
// =============================================================================

const BOT: &str = "5511988887777";

/// Decision engine answering `decide` from a queue; `wait` once it runs dry.
#[derive(Default)]
struct ScriptedDecisions {
    decisions: Mutex<VecDeque<Result<DecisionOutput, DecisionError>>>,
    seen: Mutex<Vec<DecisionRequest>>,
    decide_delay: Duration,
}

impl ScriptedDecisions {
    fn new(decisions: Vec<Result<DecisionOutput, DecisionError>>) -> Self {
        Self {
            decisions: Mutex::new(decisions.into()),
            seen: Mutex::new(Vec::new()),
            decide_delay: Duration::ZERO,
        }
    }

    /// Each `decide` takes `delay` before answering.
    fn slow(mut self, delay: Duration) -> Self {
        self.decide_delay = delay;
        self
    }
}

#[async_trait]
impl DecisionEngine for ScriptedDecisions {
    async fn generate(&self, _request: &GenerationRequest) -> Result<String, DecisionError> {
        Ok("Olá! Gostaria de saber se está faltando água.".to_string())
    }

    async fn decide(&self, request: &DecisionRequest) -> Result<DecisionOutput, DecisionError> {
        self.seen.lock().unwrap().push(request.clone());
        if !self.decide_delay.is_zero() {
            tokio::time::sleep(self.decide_delay).await;
        }
        self.decisions
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(DecisionOutput::new("wait")))
    }

    async fn summarize(&self, request: &SummaryRequest) -> Result<String, DecisionError> {
        Ok(format!("Resumo: {}", request.final_message))
    }

    async fn classify_intent(
        &self,
        _text: &str,
        _candidates: &[IntentCandidate],
    ) -> Result<IntentClassification, DecisionError> {
        Ok(IntentClassification::not_automation())
    }
}

struct Harness {
    profiles: Arc<InMemoryProfileRepository>,
    sessions: Arc<InMemorySessionRepository>,
    manager: Arc<SessionManager>,
    engine: Arc<NavigationEngine>,
    gateway: RecordingGateway,
    sink: Arc<InMemoryNotificationSink>,
    decisions: Arc<ScriptedDecisions>,
}

impl Harness {
    fn new(decisions: Vec<Result<DecisionOutput, DecisionError>>) -> Self {
        Self::with_settings(decisions, NavigationSettings::default())
    }

    fn with_settings(decisions: Vec<Result<DecisionOutput, DecisionError>>, settings: NavigationSettings) -> Self {
        Self::with_decisions(ScriptedDecisions::new(decisions), settings)
    }

    fn with_decisions(decisions: ScriptedDecisions, settings: NavigationSettings) -> Self {
        let profiles = Arc::new(InMemoryProfileRepository::new());
        let sessions = Arc::new(InMemorySessionRepository::new());
        let locks = Arc::new(KeyedLocks::new());
        let manager = Arc::new(SessionManager::new(sessions.clone(), profiles.clone(), locks.clone()));
        let gateway = RecordingGateway::new();
        let sink = Arc::new(InMemoryNotificationSink::new());
        let decisions = Arc::new(decisions);
        let engine = Arc::new(NavigationEngine::new(
            manager.clone(),
            profiles.clone(),
            decisions.clone(),
            Arc::new(gateway.clone()),
            sink.clone(),
            locks,
            NavigationSettings {
                reply_delay: ReplyDelay::none(),
                ..settings
            },
        ));
        Self {
            profiles,
            sessions,
            manager,
            engine,
            gateway,
            sink,
            decisions,
        }
    }

    async fn add_profile(&self, profile: &Profile) {
        self.profiles.create(profile).await.unwrap();
    }

    async fn start(&self, profile: &Profile) -> Session {
        let session = self
            .manager
            .create_session(command(profile), &metadata())
            .await
            .unwrap();
        self.engine.initiate(session.id()).await.unwrap()
    }

    async fn bot_says(&self, text: &str) -> IncomingOutcome {
        self.engine
            .handle_incoming(&ChannelAddress::parse(BOT).unwrap(), text)
            .await
            .unwrap()
    }
}

fn tenant() -> TenantId {
    TenantId::new("tenant-1").unwrap()
}

fn metadata() -> CommandMetadata {
    CommandMetadata::new(tenant(), OperatorId::new("operator-1").unwrap())
}

fn water_company() -> Profile {
    let mut profile = Profile::create(
        tenant(),
        NewProfile {
            channel_address: format!("{}@s.whatsapp.net", BOT),
            name: "Companhia de Água".to_string(),
            alias: Some("agua".to_string()),
            description: "Water utility support bot".to_string(),
            style: Default::default(),
            max_wait_seconds: Some(600),
            max_retries: Some(4),
        },
    )
    .unwrap();
    profile
        .add_field(
            Field::new("CPF", "111.111.111-11", FieldType::NationalId)
                .unwrap()
                .with_phrasings(vec!["Informe seu CPF".to_string()]),
        )
        .unwrap();
    profile
}

fn command(profile: &Profile) -> CreateSessionCommand {
    CreateSessionCommand {
        profile_id: *profile.id(),
        request_text: "Pergunte para a Companhia de Água se está faltando água".to_string(),
        objective: Some("ask if water is out".to_string()),
    }
}

fn session_of(outcome: &IncomingOutcome) -> &Session {
    outcome.session().expect("message should belong to a session")
}

// =============================================================================
// Scenarios
// =============================================================================

#[tokio::test]
async fn scenario_a_field_request_is_answered() {
    let harness = Harness::new(vec![Ok(DecisionOutput::new("respond").with_response("111.111.111-11"))]);
    let profile = water_company();
    harness.add_profile(&profile).await;

    let session = harness.start(&profile).await;
    assert_eq!(session.messages_sent(), 1);

    let outcome = harness.bot_says("Informe seu CPF:").await;
    let session = session_of(&outcome);

    assert_eq!(session.status(), SessionStatus::Navigating);
    assert_eq!(session.messages_sent(), 2);
    assert_eq!(harness.gateway.sent_texts().last().map(String::as_str), Some("111.111.111-11"));

    let seen = harness.decisions.seen.lock().unwrap();
    assert_eq!(seen.len(), 1);
    assert_eq!(
        seen[0].transcript.last().map(|entry| entry.text.as_str()),
        Some("Informe seu CPF:")
    );
}

#[tokio::test]
async fn scenario_b_concurrent_creates_admit_one_session() {
    let harness = Harness::new(Vec::new());
    let profile = water_company();
    harness.add_profile(&profile).await;

    let attempts: Vec<_> = (0..8)
        .map(|_| {
            let manager = harness.manager.clone();
            let cmd = command(&profile);
            tokio::spawn(async move { manager.create_session(cmd, &metadata()).await })
        })
        .collect();

    let mut created = 0;
    let mut rejected = 0;
    for attempt in attempts {
        match attempt.await.unwrap() {
            Ok(_) => created += 1,
            Err(SessionError::SessionAlreadyActive(id)) => {
                assert_eq!(&id, profile.id());
                rejected += 1;
            }
            Err(other) => panic!("unexpected error: {other}"),
        }
    }

    assert_eq!(created, 1);
    assert_eq!(rejected, 7);
    assert!(harness.sessions.find_active_by_profile(profile.id()).await.unwrap().is_some());
}

#[tokio::test]
async fn scenario_c_completion_notifies_requester() {
    let harness = Harness::new(vec![Ok(
        DecisionOutput::new("complete").with_extracted_result("Sem pendências.")
    )]);
    let profile = water_company();
    harness.add_profile(&profile).await;
    harness.start(&profile).await;

    let outcome = harness.bot_says("Não há falta de água na sua região. Sem pendências.").await;
    let session = session_of(&outcome);

    assert_eq!(session.status(), SessionStatus::Completed);
    let result = session.outcome().unwrap();
    assert!(result.success);
    assert_eq!(result.result.as_deref(), Some("Sem pendências."));

    let delivered = harness.sink.delivered();
    assert_eq!(delivered.len(), 1);
    assert_eq!(delivered[0].message, "Sem pendências.");
    assert_eq!(delivered[0].title, "Automation completed: Companhia de Água");
    assert_eq!(delivered[0].recipient.as_str(), "operator-1");
}

#[tokio::test]
async fn scenario_d_sweep_fails_overdue_session() {
    let harness = Harness::new(Vec::new());
    let profile = water_company();
    harness.add_profile(&profile).await;

    let overdue = Session::new(NewSession {
        profile_id: *profile.id(),
        tenant_id: tenant(),
        requester: OperatorId::new("operator-1").unwrap(),
        request_text: "verifique a conta".to_string(),
        objective: "check the bill".to_string(),
        deadline: Timestamp::now().minus_secs(1),
    })
    .unwrap();
    harness.sessions.insert(overdue.clone()).await;

    let sweeper = ExpirySweeper::new(harness.sessions.clone(), harness.manager.clone(), Duration::from_secs(60));
    assert_eq!(sweeper.sweep().await.unwrap(), 1);

    let stored = harness.manager.get(overdue.id()).await.unwrap();
    assert_eq!(stored.status(), SessionStatus::Failed);
    let outcome = stored.outcome().unwrap();
    assert_eq!(outcome.failure_kind, Some(FailureKind::Timeout));
    assert!(outcome.reason.contains("expired") || outcome.reason.contains("timeout"));
}

// =============================================================================
// Safety properties
// =============================================================================

#[tokio::test]
async fn budget_trips_regardless_of_decision() {
    let settings = NavigationSettings {
        ceiling_policy: CeilingPolicy::Fixed,
        message_ceiling: 2,
        ..NavigationSettings::default()
    };
    let harness = Harness::with_settings(
        vec![
            Ok(DecisionOutput::new("respond").with_response("1")),
            Ok(DecisionOutput::new("respond").with_response("2")),
        ],
        settings,
    );
    let profile = water_company();
    harness.add_profile(&profile).await;
    harness.start(&profile).await;

    let first = harness.bot_says("Escolha uma opção").await;
    assert_eq!(session_of(&first).messages_sent(), 2);

    let second = harness.bot_says("Escolha uma opção").await;
    let session = session_of(&second);
    assert_eq!(session.status(), SessionStatus::Failed);
    assert_eq!(session.outcome().unwrap().failure_kind, Some(FailureKind::BudgetExhausted));
    assert_eq!(harness.gateway.sent().len(), 2);
    assert_eq!(harness.decisions.seen.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn profile_retries_can_bound_the_budget() {
    let settings = NavigationSettings {
        ceiling_policy: CeilingPolicy::ProfileMaxRetries,
        message_ceiling: 100,
        ..NavigationSettings::default()
    };
    let respond = || Ok(DecisionOutput::new("respond").with_response("1"));
    let harness = Harness::with_settings(vec![respond(), respond(), respond(), respond()], settings);
    let profile = water_company();
    harness.add_profile(&profile).await;
    harness.start(&profile).await;

    let mut last = None;
    for _ in 0..4 {
        last = Some(harness.bot_says("Menu").await);
    }

    let last = last.unwrap();
    let session = session_of(&last);
    assert_eq!(session.status(), SessionStatus::Failed);
    assert_eq!(session.messages_sent(), 4);
}

#[tokio::test]
async fn unparseable_decisions_leave_session_waiting() {
    let harness = Harness::new(vec![
        Err(DecisionError::malformed("not json at all")),
        Ok(DecisionOutput::new("transfer_to_human")),
        Ok(DecisionOutput::new("respond")),
    ]);
    let profile = water_company();
    harness.add_profile(&profile).await;
    harness.start(&profile).await;

    for text in ["Olá", "Aguarde", "Um momento"] {
        let outcome = harness.bot_says(text).await;
        assert_eq!(session_of(&outcome).status(), SessionStatus::WaitingResponse);
    }
    assert_eq!(harness.gateway.sent().len(), 1);
}

#[tokio::test]
async fn dispatch_failure_fails_the_session() {
    let harness = Harness::new(vec![Ok(DecisionOutput::new("respond").with_response("2"))]);
    let profile = water_company();
    harness.add_profile(&profile).await;
    harness.start(&profile).await;

    harness.gateway.fail_next(GatewayError::Network("gateway down".to_string()));
    let outcome = harness.bot_says("Digite 1 ou 2").await;
    let session = session_of(&outcome);

    assert_eq!(session.status(), SessionStatus::Failed);
    assert_eq!(session.outcome().unwrap().failure_kind, Some(FailureKind::Dispatch));
    assert_eq!(session.messages_sent(), 1);
}

#[tokio::test]
async fn exit_option_ends_the_session_without_sending() {
    let harness = Harness::new(vec![Ok(DecisionOutput::new("respond").with_response("9"))]);
    let mut profile = water_company();
    let mut exit = MenuOption::new("9", "Encerrar atendimento").unwrap();
    exit.is_exit = true;
    profile.add_menu_option(exit).unwrap();
    harness.add_profile(&profile).await;
    harness.start(&profile).await;

    let outcome = harness.bot_says("1 - Segunda via\n9 - Encerrar").await;
    let session = session_of(&outcome);

    assert_eq!(session.status(), SessionStatus::Failed);
    let result = session.outcome().unwrap();
    assert_eq!(result.failure_kind, Some(FailureKind::Declined));
    assert_eq!(result.reason, "exit option selected: Encerrar atendimento");
    assert_eq!(harness.gateway.sent().len(), 1);
}

#[tokio::test]
async fn terminal_sessions_ignore_further_messages() {
    let harness = Harness::new(vec![Ok(DecisionOutput::new("fail").with_reason("service unavailable"))]);
    let profile = water_company();
    harness.add_profile(&profile).await;
    harness.start(&profile).await;

    let outcome = harness.bot_says("Serviço indisponível").await;
    assert_eq!(session_of(&outcome).status(), SessionStatus::Failed);

    let after = harness.bot_says("Olá?").await;
    assert_eq!(after, IncomingOutcome::NotHandled);
}

#[tokio::test]
async fn log_stays_gap_free_under_message_bursts() {
    let harness = Arc::new(Harness::new(Vec::new()));
    let profile = water_company();
    harness.add_profile(&profile).await;
    let session = harness.start(&profile).await;

    let bursts: Vec<_> = (0..10)
        .map(|i| {
            let harness = harness.clone();
            tokio::spawn(async move { harness.bot_says(&format!("mensagem {i}")).await })
        })
        .collect();
    for burst in bursts {
        burst.await.unwrap();
    }

    let stored = harness.manager.get(session.id()).await.unwrap();
    assert_eq!(stored.log().len(), 11);
    for (index, entry) in stored.log().iter().enumerate() {
        assert_eq!(entry.seq as usize, index);
    }
    assert!(stored
        .log()
        .windows(2)
        .all(|pair| pair[0].at <= pair[1].at));
}

// =============================================================================
// Cancel racing an in-flight turn
// =============================================================================

async fn cancel_mid_decision(harness: Arc<Harness>, session: &Session) -> IncomingOutcome {
    let turn = {
        let harness = harness.clone();
        tokio::spawn(async move { harness.bot_says("Informe seu CPF:").await })
    };
    tokio::time::sleep(Duration::from_millis(50)).await;
    harness.manager.cancel(session.id()).await.unwrap();
    turn.await.unwrap()
}

#[tokio::test]
async fn cancel_during_decision_sends_nothing_more() {
    let decisions = ScriptedDecisions::new(vec![Ok(DecisionOutput::new("respond").with_response("111.111.111-11"))])
        .slow(Duration::from_millis(200));
    let harness = Arc::new(Harness::with_decisions(decisions, NavigationSettings::default()));
    let profile = water_company();
    harness.add_profile(&profile).await;
    let session = harness.start(&profile).await;

    let outcome = cancel_mid_decision(harness.clone(), &session).await;

    assert_eq!(session_of(&outcome).status(), SessionStatus::Failed);
    let sent = harness.gateway.sent_texts();
    assert_eq!(sent.len(), 1);
    assert!(!sent.iter().any(|text| text.contains("111.111.111-11")));

    let stored = harness.manager.get(session.id()).await.unwrap();
    assert_eq!(stored.log().len(), 2);
    assert_eq!(stored.messages_sent(), 1);
    assert_eq!(stored.outcome().unwrap().failure_kind, Some(FailureKind::Cancelled));
}

#[tokio::test]
async fn cancel_during_decision_suppresses_completion() {
    let decisions = ScriptedDecisions::new(vec![Ok(
        DecisionOutput::new("complete").with_extracted_result("Sem pendências.")
    )])
    .slow(Duration::from_millis(200));
    let harness = Arc::new(Harness::with_decisions(decisions, NavigationSettings::default()));
    let profile = water_company();
    harness.add_profile(&profile).await;
    let session = harness.start(&profile).await;

    let outcome = cancel_mid_decision(harness.clone(), &session).await;

    let session = session_of(&outcome);
    assert_eq!(session.status(), SessionStatus::Failed);
    let result = session.outcome().unwrap();
    assert!(!result.success);
    assert_eq!(result.failure_kind, Some(FailureKind::Cancelled));
    assert!(harness.sink.delivered().is_empty());
}
