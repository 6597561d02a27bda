//! Application configuration module
//!
//! Type-safe configuration loaded from environment variables with the
//! `config` and `dotenvy` crates. Variables use the `CHAT_AUTOPILOT` prefix
//! and `__` between nested keys.
//!
//! # Example
//!
//! ```no_run
//! use chat_autopilot::config::AppConfig;
//!
//! let config = AppConfig::load().expect("Failed to load configuration");
//! config.validate().expect("Invalid configuration");
//! ```

mod ai;
mod database;
mod error;
mod gateway;
mod navigation;
mod server;

pub use ai::{AiConfig, AiProvider};
pub use database::DatabaseConfig;
pub use error::{ConfigError, ValidationError};
pub use gateway::{GatewayConfig, MAX_SEND_TIMEOUT_SECS};
pub use navigation::{IntentConfig, NavigationConfig};
pub use server::{Environment, ServerConfig};

use serde::Deserialize;

use crate::application::navigation::NavigationSettings;

/// Root application configuration
///
/// Every section has defaults, so an empty environment yields a runnable
/// development setup (in-memory storage, mock AI, recording gateway).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub database: DatabaseConfig,

    #[serde(default)]
    pub ai: AiConfig,

    #[serde(default)]
    pub gateway: GatewayConfig,

    #[serde(default)]
    pub navigation: NavigationConfig,

    #[serde(default)]
    pub intent: IntentConfig,
}

impl AppConfig {
    /// Load configuration from environment variables
    ///
    /// This function:
    /// 1. Loads `.env` file if present (for development)
    /// 2. Reads environment variables with `CHAT_AUTOPILOT` prefix
    /// 3. Uses `__` (double underscore) to separate nested values
    ///
    /// # Environment Variable Format
    ///
    /// - `CHAT_AUTOPILOT__SERVER__PORT=8080` -> `server.port = 8080`
    /// - `CHAT_AUTOPILOT__NAVIGATION__CEILING_POLICY=profile_max_retries`
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(
                config::Environment::default()
                    .prefix("CHAT_AUTOPILOT")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()?;

        Ok(config)
    }

    /// Validate all configuration values. Production additionally requires
    /// real AI and gateway credentials.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let production = self.is_production();
        self.server.validate()?;
        self.database.validate()?;
        self.ai.validate(production)?;
        self.gateway.validate(production)?;
        self.navigation.validate()?;
        Ok(())
    }

    pub fn is_production(&self) -> bool {
        self.server.is_production()
    }

    pub fn navigation_settings(&self) -> Result<NavigationSettings, ValidationError> {
        self.navigation.settings(self.gateway.send_timeout())
    }
}
