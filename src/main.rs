//! chat-autopilot server binary.
//!
//! Loads configuration, wires adapters into the navigation engine, starts the
//! expiry sweeper and serves the HTTP API until Ctrl-C / SIGTERM.

use std::sync::Arc;

use sqlx::postgres::PgPoolOptions;
use thiserror::Error;
use tokio::sync::watch;
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use chat_autopilot::adapters::ai::{AnthropicConfig, AnthropicProvider, LlmDecisionEngine, MockAIProvider};
use chat_autopilot::adapters::gateway::{HttpGatewayConfig, HttpMessageGateway, RecordingGateway};
use chat_autopilot::adapters::http::{build_router, ApiContext, HttpSettings};
use chat_autopilot::adapters::memory::{InMemoryProfileRepository, InMemorySessionRepository};
use chat_autopilot::adapters::notification::LogNotificationSink;
use chat_autopilot::adapters::postgres::{PostgresProfileRepository, PostgresSessionRepository};
use chat_autopilot::application::navigation::{
    ExpirySweeper, IntentDetector, KeyedLocks, NavigationEngine, SessionManager,
};
use chat_autopilot::config::{AiProvider, AppConfig, ConfigError, ValidationError};
use chat_autopilot::ports::{
    AIError, AIProvider, ContactDirectory, GatewayError, MessageGateway, ProfileRepository, SessionRepository,
};

#[derive(Debug, Error)]
enum StartupError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Invalid configuration: {0}")]
    Validation(#[from] ValidationError),

    #[error("Database connection failed: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration failed: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("AI provider setup failed: {0}")]
    Ai(#[from] AIError),

    #[error("Gateway setup failed: {0}")]
    Gateway(#[from] GatewayError),

    #[error("Invalid bind address: {0}")]
    Address(#[from] std::net::AddrParseError),

    #[error("Server error: {0}")]
    Io(#[from] std::io::Error),
}

#[tokio::main]
async fn main() {
    let config = match AppConfig::load() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("Failed to load configuration: {}", err);
            std::process::exit(1);
        }
    };

    init_tracing(&config);

    if let Err(err) = run(config).await {
        error!(error = %err, "chat-autopilot stopped");
        std::process::exit(1);
    }
}

fn init_tracing(config: &AppConfig) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.server.log_level));
    let registry = tracing_subscriber::registry().with(filter);
    if config.is_production() {
        registry.with(fmt::layer().json().with_current_span(false)).init();
    } else {
        registry.with(fmt::layer().with_target(true).with_line_number(true)).init();
    }
}

type Repositories = (Arc<dyn ProfileRepository>, Arc<dyn SessionRepository>);

async fn repositories(config: &AppConfig) -> Result<Repositories, StartupError> {
    let Some(url) = config.database.url() else {
        warn!("No database URL configured, using in-memory storage");
        let profiles: Arc<dyn ProfileRepository> = Arc::new(InMemoryProfileRepository::new());
        let sessions: Arc<dyn SessionRepository> = Arc::new(InMemorySessionRepository::new());
        return Ok((profiles, sessions));
    };

    let pool = PgPoolOptions::new()
        .min_connections(config.database.min_connections)
        .max_connections(config.database.max_connections)
        .acquire_timeout(config.database.acquire_timeout())
        .connect(url)
        .await?;

    if config.database.run_migrations {
        sqlx::migrate!("./migrations").run(&pool).await?;
        info!("Database migrations applied");
    }

    let profiles: Arc<dyn ProfileRepository> = Arc::new(PostgresProfileRepository::new(pool.clone()));
    let sessions: Arc<dyn SessionRepository> = Arc::new(PostgresSessionRepository::new(pool));
    Ok((profiles, sessions))
}

fn ai_provider(config: &AppConfig) -> Result<Arc<dyn AIProvider>, StartupError> {
    match (config.ai.provider, config.ai.anthropic_api_key.clone()) {
        (AiProvider::Anthropic, Some(key)) => {
            let mut anthropic = AnthropicConfig::from_secret(key)
                .with_timeout(config.ai.timeout())
                .with_max_retries(config.ai.max_retries);
            if let Some(model) = &config.ai.model {
                anthropic = anthropic.with_model(model.clone());
            }
            if let Some(base_url) = &config.ai.base_url {
                anthropic = anthropic.with_base_url(base_url.clone());
            }
            let provider: Arc<dyn AIProvider> = Arc::new(AnthropicProvider::new(anthropic)?);
            Ok(provider)
        }
        (AiProvider::Anthropic, None) => Err(ValidationError::MissingRequired("AI__ANTHROPIC_API_KEY").into()),
        (AiProvider::Mock, _) => {
            warn!("Using mock AI provider, decisions are canned");
            let provider: Arc<dyn AIProvider> = Arc::new(MockAIProvider::new());
            Ok(provider)
        }
    }
}

type Gateway = (Arc<dyn MessageGateway>, Arc<dyn ContactDirectory>);

fn gateway(config: &AppConfig) -> Result<Gateway, StartupError> {
    let gateway = &config.gateway;
    let Some(api_key) = gateway.api_key() else {
        warn!("No gateway API key configured, outbound messages are recorded only");
        let recording = Arc::new(RecordingGateway::new());
        let messages: Arc<dyn MessageGateway> = recording.clone();
        let contacts: Arc<dyn ContactDirectory> = recording;
        return Ok((messages, contacts));
    };

    let http = Arc::new(HttpMessageGateway::new(
        HttpGatewayConfig::new(&gateway.base_url, &gateway.instance, api_key.clone())
            .with_timeout(gateway.send_timeout()),
    )?);
    let messages: Arc<dyn MessageGateway> = http.clone();
    let contacts: Arc<dyn ContactDirectory> = http;
    Ok((messages, contacts))
}

async fn run(config: AppConfig) -> Result<(), StartupError> {
    config.validate()?;
    let settings = config.navigation_settings()?;

    let (profiles, sessions) = repositories(&config).await?;
    let decisions = Arc::new(LlmDecisionEngine::new(ai_provider(&config)?));
    let (messages, contacts) = gateway(&config)?;

    let locks = Arc::new(KeyedLocks::new());
    let manager = Arc::new(SessionManager::new(sessions.clone(), profiles.clone(), locks.clone()));
    let engine = Arc::new(NavigationEngine::new(
        manager.clone(),
        profiles.clone(),
        decisions.clone(),
        messages,
        Arc::new(LogNotificationSink),
        locks,
        settings,
    ));
    let intent_detector = Arc::new(IntentDetector::new(
        config.intent.filter(),
        profiles.clone(),
        decisions,
        manager.clone(),
        engine.clone(),
        config.navigation.decision_timeout(),
    ));

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let sweeper = ExpirySweeper::new(sessions.clone(), manager.clone(), config.navigation.sweep_interval());
    let sweeper_handle = tokio::spawn(async move { sweeper.run(shutdown_rx).await });

    let router = build_router(
        ApiContext {
            profiles,
            sessions,
            manager,
            engine,
            intent_detector,
            contacts,
            default_max_wait_seconds: config.navigation.default_max_wait_secs,
            webhook_secret: config.gateway.webhook_secret().cloned(),
        },
        &HttpSettings {
            cors_origins: config.server.cors_origins_list(),
            request_timeout: config.server.request_timeout(),
        },
    );

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, environment = ?config.server.environment, "chat-autopilot listening");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Shutting down");
    let _ = shutdown_tx.send(true);
    if let Err(err) = sweeper_handle.await {
        warn!(error = %err, "Expiry sweeper task ended abnormally");
    }
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            warn!(error = %err, "Could not listen for Ctrl-C");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                warn!(error = %err, "Could not listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
